//! The host-function table mounted into the guest under the `env` namespace.
//!
//! Host functions that hand variable-sized data back to the guest use the
//! callback-allocation protocol: the host invokes the guest function at table
//! index `cb_alloc` with `(cb_alloc_data, size)`, requires an i32 result,
//! bounds-checks the returned region, and writes the payload into it. The
//! host never re-enters the guest except through that callback, at most once
//! per host call.

use std::io::Write;

use bytes::Bytes;
use tracing::trace;

use crate::db::QueryDatabase;
use crate::errors::VmError;
use crate::memory;
use crate::runtime::{GuestContext, GuestValue};

/// Per-request state plus the host-call implementations. One of these lives
/// for the duration of a single guest invocation.
pub struct HostCallbacks<'a> {
    db: &'a dyn QueryDatabase,
    /// Serialized `database_status` blob for the current snapshot.
    database_status: Bytes,
    /// The current sub-request's payload (the bytes after namespace and
    /// short name).
    input: Bytes,
    /// Whatever the guest last wrote through `set_output_data`.
    reply: Vec<u8>,
    /// The snapshot's head; caps every `query_database` call.
    max_block: u32,
    /// Forward `print_range` bytes to stderr.
    console: bool,
}

impl<'a> HostCallbacks<'a> {
    pub fn new(
        db: &'a dyn QueryDatabase,
        database_status: Bytes,
        input: Bytes,
        max_block: u32,
        console: bool,
    ) -> Self {
        HostCallbacks {
            db,
            database_status,
            input,
            reply: Vec::new(),
            max_block,
            console,
        }
    }

    pub fn take_reply(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.reply)
    }

    /// Route an `env` import call by name. This is the single entry point
    /// interpreter glue dispatches through; none of the host functions
    /// return a value.
    pub fn dispatch(
        &mut self,
        import: &str,
        args: &[GuestValue],
        guest: &mut dyn GuestContext,
    ) -> Result<(), VmError> {
        trace!(import, "guest host call");
        match import {
            "abort" => {
                u32_args::<0>(args)?;
                self.abort()
            }
            "eosio_assert_message" => {
                let [cond, msg_ptr, msg_len] = u32_args::<3>(args)?;
                self.assert_message(guest, cond, msg_ptr, msg_len)
            }
            "get_database_status" => {
                let [cb_alloc_data, cb_alloc] = u32_args::<2>(args)?;
                self.get_database_status(guest, cb_alloc_data, cb_alloc)
            }
            "get_input_data" => {
                let [cb_alloc_data, cb_alloc] = u32_args::<2>(args)?;
                self.get_input_data(guest, cb_alloc_data, cb_alloc)
            }
            "set_output_data" => {
                let [begin, end] = u32_args::<2>(args)?;
                self.set_output_data(guest, begin, end)
            }
            "query_database" => {
                let [req_begin, req_end, cb_alloc_data, cb_alloc] = u32_args::<4>(args)?;
                self.query_database(guest, req_begin, req_end, cb_alloc_data, cb_alloc)
            }
            "print_range" => {
                let [begin, end] = u32_args::<2>(args)?;
                self.print_range(guest, begin, end)
            }
            other => Err(VmError::UnknownImport(other.to_string())),
        }
    }

    /// Guest-initiated fatal abort.
    pub fn abort(&mut self) -> Result<(), VmError> {
        Err(VmError::Abort)
    }

    /// If `cond` is zero, fail with the guest-supplied message.
    pub fn assert_message(
        &mut self,
        guest: &mut dyn GuestContext,
        cond: u32,
        msg_ptr: u32,
        msg_len: u32,
    ) -> Result<(), VmError> {
        if cond != 0 {
            return Ok(());
        }
        let bytes = memory::check_range(guest.memory(), msg_ptr, msg_len)?;
        Err(VmError::Assert(String::from_utf8_lossy(bytes).into_owned()))
    }

    /// Deliver the serialized `database_status` blob.
    pub fn get_database_status(
        &mut self,
        guest: &mut dyn GuestContext,
        cb_alloc_data: u32,
        cb_alloc: u32,
    ) -> Result<(), VmError> {
        deliver(guest, cb_alloc_data, cb_alloc, &self.database_status)
    }

    /// Deliver the current sub-request's payload.
    pub fn get_input_data(
        &mut self,
        guest: &mut dyn GuestContext,
        cb_alloc_data: u32,
        cb_alloc: u32,
    ) -> Result<(), VmError> {
        deliver(guest, cb_alloc_data, cb_alloc, &self.input)
    }

    /// Replace the reply with the guest bytes in `[begin, end)`.
    pub fn set_output_data(
        &mut self,
        guest: &mut dyn GuestContext,
        begin: u32,
        end: u32,
    ) -> Result<(), VmError> {
        let bytes = memory::check_pair(guest.memory(), begin, end)?;
        self.reply = bytes.to_vec();
        Ok(())
    }

    /// Forward a guest-built request to the snapshot session, capped at the
    /// snapshot's head, and deliver the reply.
    pub fn query_database(
        &mut self,
        guest: &mut dyn GuestContext,
        req_begin: u32,
        req_end: u32,
        cb_alloc_data: u32,
        cb_alloc: u32,
    ) -> Result<(), VmError> {
        let request = memory::check_pair(guest.memory(), req_begin, req_end)?.to_vec();
        let result = self.db.query(&request, self.max_block)?;
        deliver(guest, cb_alloc_data, cb_alloc, &result)
    }

    /// Write guest bytes to the diagnostic sink iff the console flag is set.
    /// Bounds are checked either way.
    pub fn print_range(
        &mut self,
        guest: &mut dyn GuestContext,
        begin: u32,
        end: u32,
    ) -> Result<(), VmError> {
        let bytes = memory::check_pair(guest.memory(), begin, end)?;
        if self.console {
            let _ = std::io::stderr().write_all(bytes);
        }
        Ok(())
    }
}

/// The callback-allocation protocol: ask the guest for `payload.len()` bytes
/// and copy the payload into the region it returns.
fn deliver(
    guest: &mut dyn GuestContext,
    cb_alloc_data: u32,
    cb_alloc: u32,
    payload: &[u8],
) -> Result<(), VmError> {
    let size = payload.len() as u32;
    let offset = match guest.call_indirect(cb_alloc, (cb_alloc_data, size))? {
        GuestValue::I32(offset) => offset as u32,
        _ => return Err(VmError::BadCallbackReturn),
    };
    // write_at re-checks [offset, offset + size) against linear memory.
    memory::write_at(guest.memory(), offset, payload)
}

fn u32_args<const N: usize>(args: &[GuestValue]) -> Result<[u32; N], VmError> {
    if args.len() != N {
        return Err(VmError::BadArguments("wrong host-call arity"));
    }
    let mut out = [0u32; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        match arg {
            GuestValue::I32(value) => *slot = *value as u32,
            _ => return Err(VmError::BadArguments("host-call argument is not i32")),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{AllocBehavior, CB_ALLOC_INDEX, FakeGuest, NullDatabase};

    fn host(db: &dyn QueryDatabase) -> HostCallbacks<'_> {
        HostCallbacks::new(
            db,
            Bytes::from_static(b"status-blob"),
            Bytes::from_static(b"input-bytes"),
            10,
            false,
        )
    }

    #[test]
    fn callback_allocation_delivers_the_payload() {
        let db = NullDatabase;
        let mut host = host(&db);
        let mut guest = FakeGuest::new(0x4000);

        host.get_database_status(&mut guest, 0x1000, CB_ALLOC_INDEX)
            .unwrap();

        let call = guest.alloc_calls.last().unwrap();
        assert_eq!(call.cb_alloc_data, 0x1000);
        assert_eq!(call.size, 11);
        let written = &guest.memory[call.offset as usize..(call.offset + call.size) as usize];
        assert_eq!(written, b"status-blob");
    }

    #[test]
    fn input_data_is_the_sub_request_payload() {
        let db = NullDatabase;
        let mut host = host(&db);
        let mut guest = FakeGuest::new(0x4000);

        host.get_input_data(&mut guest, 0, CB_ALLOC_INDEX).unwrap();
        let call = guest.alloc_calls.last().unwrap();
        let written = &guest.memory[call.offset as usize..(call.offset + call.size) as usize];
        assert_eq!(written, b"input-bytes");
    }

    #[test]
    fn out_of_bounds_allocation_is_bad_memory() {
        let db = NullDatabase;
        let mut host = host(&db);
        let mut guest = FakeGuest::with_alloc(0x100, AllocBehavior::OutOfBounds);

        let err = host
            .get_database_status(&mut guest, 0, CB_ALLOC_INDEX)
            .unwrap_err();
        assert!(matches!(err, VmError::BadMemory));
    }

    #[test]
    fn non_i32_callback_return_is_fatal() {
        let db = NullDatabase;
        let mut host = host(&db);
        let mut guest = FakeGuest::with_alloc(0x100, AllocBehavior::WrongType);

        let err = host
            .get_database_status(&mut guest, 0, CB_ALLOC_INDEX)
            .unwrap_err();
        assert!(matches!(err, VmError::BadCallbackReturn));
    }

    #[test]
    fn assert_message_surfaces_the_guest_message() {
        let db = NullDatabase;
        let mut host = host(&db);
        let mut guest = FakeGuest::new(0x100);
        guest.memory[0x10..0x19].copy_from_slice(b"bad input");

        // A true condition is a no-op.
        host.assert_message(&mut guest, 1, 0x10, 9).unwrap();

        let err = host.assert_message(&mut guest, 0, 0x10, 9).unwrap_err();
        match err {
            VmError::Assert(message) => assert_eq!(message, "bad input"),
            other => panic!("expected assert, got {other:?}"),
        }
    }

    #[test]
    fn set_output_data_replaces_prior_content() {
        let db = NullDatabase;
        let mut host = host(&db);
        let mut guest = FakeGuest::new(0x100);
        guest.memory[0..3].copy_from_slice(b"one");
        guest.memory[8..11].copy_from_slice(b"two");

        host.set_output_data(&mut guest, 0, 3).unwrap();
        host.set_output_data(&mut guest, 8, 11).unwrap();
        assert_eq!(host.take_reply(), b"two");
        assert!(host.take_reply().is_empty());
    }

    #[test]
    fn set_output_data_checks_bounds() {
        let db = NullDatabase;
        let mut host = host(&db);
        let mut guest = FakeGuest::new(0x10);
        assert!(matches!(
            host.set_output_data(&mut guest, 8, 4),
            Err(VmError::BadMemory)
        ));
        assert!(matches!(
            host.set_output_data(&mut guest, 8, 0x20),
            Err(VmError::BadMemory)
        ));
    }

    #[test]
    fn dispatch_rejects_unknown_imports_and_bad_arity() {
        let db = NullDatabase;
        let mut host = host(&db);
        let mut guest = FakeGuest::new(0x100);

        let err = host
            .dispatch("no_such_import", &[], &mut guest)
            .unwrap_err();
        assert!(matches!(err, VmError::UnknownImport(name) if name == "no_such_import"));

        let err = host
            .dispatch("set_output_data", &[GuestValue::I32(0)], &mut guest)
            .unwrap_err();
        assert!(matches!(err, VmError::BadArguments(_)));

        let err = host
            .dispatch(
                "set_output_data",
                &[GuestValue::I32(0), GuestValue::I64(3)],
                &mut guest,
            )
            .unwrap_err();
        assert!(matches!(err, VmError::BadArguments(_)));
    }

    #[test]
    fn dispatch_routes_abort() {
        let db = NullDatabase;
        let mut host = host(&db);
        let mut guest = FakeGuest::new(0x100);
        let err = host.dispatch("abort", &[], &mut guest).unwrap_err();
        assert!(matches!(err, VmError::Abort));
    }

    #[test]
    fn query_database_round_trips_through_the_session() {
        struct EchoDb;
        impl QueryDatabase for EchoDb {
            fn query(&self, request: &[u8], max_block: u32) -> Result<Vec<u8>, VmError> {
                let mut reply = request.to_vec();
                reply.extend_from_slice(&max_block.to_le_bytes());
                Ok(reply)
            }
        }

        let db = EchoDb;
        let mut host = HostCallbacks::new(&db, Bytes::new(), Bytes::new(), 7, false);
        let mut guest = FakeGuest::new(0x1000);
        guest.memory[0..4].copy_from_slice(b"req!");

        host.query_database(&mut guest, 0, 4, 0, CB_ALLOC_INDEX)
            .unwrap();
        let call = guest.alloc_calls.last().unwrap();
        let written = &guest.memory[call.offset as usize..(call.offset + call.size) as usize];
        assert_eq!(&written[..4], b"req!");
        assert_eq!(&written[4..], 7u32.to_le_bytes());
    }
}
