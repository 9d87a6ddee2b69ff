//! Per-request state machine:
//!
//! ```text
//! OPEN_SNAPSHOT -> FILL_CONTEXT -> RUN_GUEST -> FORK_CHECK -> {COMMIT | RETRY | FAIL}
//! ```
//!
//! A fork detected at any sub-request boundary discards the attempt's staged
//! reply and restarts the whole request on a fresh snapshot, so every
//! committed reply observed a single consistent view. The session is dropped
//! on every exit path from an attempt.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use quarry_common::{DatabaseStatus, Name};
use quarry_storage::{QuerySession, Store};
use quarry_vm::{GuestRuntime, HostCallbacks, QueryDatabase, VmError, loader};
use quarry_wire::{WireDecode, WireEncode, decode_varuint32, encode_varuint32};
use tracing::{debug, info};

use crate::error::QueryError;

/// Total attempts per request. A fork on the final attempt fails the request
/// instead of retrying; there is no backoff.
pub const MAX_QUERY_ATTEMPTS: u32 = 4;

const LOCAL_NAMESPACE: Name = Name::from_static("local");
const LEGACY_SHORT_NAME: Name = Name::from_static("legacy");

/// The query execution host. `Clone`-free by design: one instance serves many
/// threads behind an `Arc`, with all per-request state on the stack.
pub struct QueryHost {
    store: Store,
    runtime: Arc<dyn GuestRuntime>,
    wasm_dir: PathBuf,
    console: bool,
}

/// Adapter handing the snapshot session to the host-call bridge.
struct SessionDatabase<'a>(&'a QuerySession);

impl QueryDatabase for SessionDatabase<'_> {
    fn query(&self, request: &[u8], max_block: u32) -> Result<Vec<u8>, VmError> {
        self.0
            .query_database(request, max_block)
            .map_err(|err| VmError::Database(err.to_string()))
    }
}

impl QueryHost {
    pub fn new(
        store: Store,
        runtime: Arc<dyn GuestRuntime>,
        wasm_dir: impl Into<PathBuf>,
        console: bool,
    ) -> Self {
        QueryHost {
            store,
            runtime,
            wasm_dir: wasm_dir.into(),
            console,
        }
    }

    /// Service a multi-sub-request envelope: `varuint32 n`, then `n`
    /// length-prefixed `(namespace, short_name, payload)` sub-requests. The
    /// reply mirrors the structure: `varuint32 n`, then `n` length-prefixed
    /// guest replies.
    pub fn query(&self, request: &[u8]) -> Result<Vec<u8>, QueryError> {
        self.retry_loop(|session, status| self.run_envelope(session, status, request))
    }

    /// Service a legacy single request: the guest input is synthesized as
    /// `(target, request)` and the module short name is the literal
    /// `legacy`. The reply is the raw guest output, not count-framed.
    pub fn legacy_query(&self, target: &str, request: &[u8]) -> Result<Vec<u8>, QueryError> {
        let mut synthesized = Vec::new();
        target.encode(&mut synthesized);
        request.encode(&mut synthesized);
        let input = Bytes::from(synthesized);

        self.retry_loop(|session, status| {
            let reply = self.run_guest(session, status, LEGACY_SHORT_NAME, input.clone())?;
            if did_fork(session, status) {
                return Ok(None);
            }
            Ok(Some(reply))
        })
    }

    /// The bounded retry state machine. The body returns `Ok(Some(reply))`
    /// to commit, `Ok(None)` when a fork discarded the attempt.
    fn retry_loop<F>(&self, mut attempt_body: F) -> Result<Vec<u8>, QueryError>
    where
        F: FnMut(&QuerySession, &DatabaseStatus) -> Result<Option<Vec<u8>>, QueryError>,
    {
        for attempt in 1..=MAX_QUERY_ATTEMPTS {
            let session = self.store.create_query_session()?;
            let status = session.fill_status().clone();
            if status.head == 0 {
                return Err(QueryError::EmptyDatabase);
            }
            match attempt_body(&session, &status)? {
                Some(reply) => {
                    debug!(attempt, reply_len = reply.len(), "query committed");
                    return Ok(reply);
                }
                None if attempt < MAX_QUERY_ATTEMPTS => info!(attempt, "retry request"),
                None => {}
            }
            // The session drops here, releasing the snapshot on every path.
        }
        Err(QueryError::TooManyForks)
    }

    fn run_envelope(
        &self,
        session: &QuerySession,
        status: &DatabaseStatus,
        request: &[u8],
    ) -> Result<Option<Vec<u8>>, QueryError> {
        let (count, mut rest) = decode_varuint32(request)?;
        let mut staging = Vec::new();
        encode_varuint32(count, &mut staging);
        for _ in 0..count {
            let (sub_request, tail) = Vec::<u8>::decode_unfinished(rest)?;
            rest = tail;

            let (namespace, sub_rest) = Name::decode_unfinished(&sub_request)?;
            if namespace != LOCAL_NAMESPACE {
                return Err(QueryError::UnknownNamespace(namespace));
            }
            let (short_name, payload) = Name::decode_unfinished(sub_rest)?;

            let reply =
                self.run_guest(session, status, short_name, Bytes::copy_from_slice(payload))?;
            if did_fork(session, status) {
                // Discard the staged replies; the caller restarts from the
                // first sub-request under a fresh snapshot.
                return Ok(None);
            }
            reply.encode(&mut staging);
        }
        Ok(Some(staging))
    }

    /// RUN_GUEST: load the module for `short_name`, mount the host functions,
    /// and let it produce a reply against this attempt's snapshot.
    fn run_guest(
        &self,
        session: &QuerySession,
        status: &DatabaseStatus,
        short_name: Name,
        input: Bytes,
    ) -> Result<Vec<u8>, QueryError> {
        let path = loader::module_path(&self.wasm_dir, short_name);
        let db = SessionDatabase(session);
        let mut host = HostCallbacks::new(
            &db,
            Bytes::from(status.encode_to_vec()),
            input,
            status.head,
            self.console,
        );
        self.runtime.run_query(&path, &mut host)?;
        Ok(host.take_reply())
    }
}

/// FORK_CHECK: the chain forked iff the head captured at OPEN_SNAPSHOT is no
/// longer there, or its id changed.
fn did_fork(session: &QuerySession, status: &DatabaseStatus) -> bool {
    match session.get_block_id(status.head) {
        None => {
            info!(head = status.head, "fork detected (prev head not found)");
            true
        }
        Some(id) if id != status.head_id => {
            info!(head = status.head, "fork detected (head_id changed)");
            true
        }
        _ => false,
    }
}
