//! End-to-end driver scenarios: snapshot consistency, fork retry, the
//! callback-allocation protocol, and the request/reply framing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;
use quarry_common::keys::{CompositeKey, KeyValue};
use quarry_common::{
    ActionTrace, BlockInfo, Checksum256, DatabaseStatus, Name, TransactionStatus,
};
use quarry_host::{MAX_QUERY_ATTEMPTS, QueryError, QueryHost};
use quarry_storage::{InMemoryBackend, Store};
use quarry_vm::VmError;
use quarry_vm::HostCallbacks;
use quarry_vm::test_utils::{AllocBehavior, CB_ALLOC_INDEX, FakeGuest, ScriptedRuntime};
use quarry_wire::{WireDecode, WireEncode, decode_varuint32, encode_varuint32};

fn name(text: &str) -> Name {
    text.parse().unwrap()
}

fn block(num: u32, id_byte: u8) -> BlockInfo {
    BlockInfo {
        block_num: num,
        block_id: Checksum256([id_byte; 32]),
        ..BlockInfo::default()
    }
}

fn backend_with_chain(head: u32) -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    for num in 1..=head {
        backend.add_block(block(num, num as u8)).unwrap();
    }
    backend
}

fn host_with(backend: &InMemoryBackend, runtime: ScriptedRuntime) -> QueryHost {
    QueryHost::new(
        Store::new(backend.clone()),
        Arc::new(runtime),
        "/var/lib/quarry/wasm",
        false,
    )
}

/// Build the outer envelope: `varuint32 n`, then `n` length-prefixed
/// `(namespace, short_name, payload)` sub-requests.
fn envelope(subs: &[(&str, &str, Vec<u8>)]) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_varuint32(subs.len() as u32, &mut buf);
    for (namespace, short_name, payload) in subs {
        let mut sub = Vec::new();
        name(namespace).encode(&mut sub);
        name(short_name).encode(&mut sub);
        sub.extend_from_slice(payload);
        sub.encode(&mut buf);
    }
    buf
}

fn decode_frames(reply: &[u8]) -> Vec<Vec<u8>> {
    let (count, mut rest) = decode_varuint32(reply).unwrap();
    let mut frames = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (frame, tail) = Vec::<u8>::decode_unfinished(rest).unwrap();
        frames.push(frame);
        rest = tail;
    }
    assert!(rest.is_empty(), "trailing bytes after reply frames");
    frames
}

/// A guest body that fetches its input, runs it through `query_database`,
/// and returns the query reply.
fn echo_query_body(host: &mut HostCallbacks<'_>, guest: &mut FakeGuest) -> Result<(), VmError> {
    host.get_input_data(guest, 0, CB_ALLOC_INDEX)?;
    let (begin, len) = guest.last_alloc().expect("input was delivered");
    host.query_database(guest, begin, begin + len, 0, CB_ALLOC_INDEX)?;
    let (begin, len) = guest.last_alloc().expect("reply was delivered");
    host.set_output_data(guest, begin, begin + len)
}

/// S1: an empty history fails with `empty_database` before any guest runs.
#[test]
fn empty_database_fails_without_running_a_guest() {
    let backend = InMemoryBackend::new();
    let invocations = Arc::new(AtomicU32::new(0));
    let counter = invocations.clone();
    let runtime = ScriptedRuntime::new(move |_path, _host, _guest| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let host = host_with(&backend, runtime);

    let err = host
        .query(&envelope(&[("local", "block.info", Vec::new())]))
        .unwrap_err();
    assert!(matches!(err, QueryError::EmptyDatabase));
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

/// S2: one block, one action trace; the reply carries exactly the serialized
/// trace, delivered through the real query pipeline.
#[test]
fn single_trace_query_round_trips() {
    let backend = backend_with_chain(1);
    let trace = ActionTrace {
        block_index: 1,
        transaction_id: Checksum256([0x11; 32]),
        transaction_status: TransactionStatus::Executed,
        receipt_receiver: name("alice"),
        account: name("token"),
        name: name("transfer"),
        data: Bytes::from_static(b"hi"),
        ..ActionTrace::default()
    };
    backend.add_action_trace(trace.clone()).unwrap();

    let runtime = ScriptedRuntime::new(|path, host, guest| {
        assert!(path.ends_with("at.e.nra-server.wasm"));
        echo_query_body(host, guest)
    });
    let host = host_with(&backend, runtime);

    let mut payload = Vec::new();
    name("at.e.nra").encode(&mut payload);
    1u32.encode(&mut payload);
    CompositeKey::new(vec![
        KeyValue::Name(Name(0)),
        KeyValue::Name(Name(0)),
        KeyValue::Name(Name(0)),
        KeyValue::U32(0),
        KeyValue::Checksum256(Checksum256::ZERO),
        KeyValue::U32(0),
    ])
    .encode_wire(&mut payload);
    CompositeKey::new(vec![
        KeyValue::Name(Name(u64::MAX)),
        KeyValue::Name(Name(u64::MAX)),
        KeyValue::Name(Name(u64::MAX)),
        KeyValue::U32(u32::MAX),
        KeyValue::Checksum256(Checksum256([0xff; 32])),
        KeyValue::U32(u32::MAX),
    ])
    .encode_wire(&mut payload);
    10u32.encode(&mut payload);

    let reply = host
        .query(&envelope(&[("local", "at.e.nra", payload)]))
        .unwrap();
    let frames = decode_frames(&reply);
    assert_eq!(frames.len(), 1);

    // The frame is a vector<vector<byte>> with one inner blob: the trace.
    let rows = decode_frames(&frames[0]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], trace.encode_to_vec());
}

/// S3: a fork lands between RUN_GUEST and FORK_CHECK; the driver retries once
/// and commits whatever attempt 2 produced.
#[test]
fn fork_between_run_and_check_retries_once() {
    let backend = backend_with_chain(3);
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = attempts.clone();
    let forker = backend.clone();
    let runtime = ScriptedRuntime::new(move |_path, host, guest| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
        guest.memory[0] = attempt as u8;
        host.set_output_data(guest, 0, 1)?;
        if attempt == 1 {
            // Replace the head under the open session.
            forker.add_block(block(3, 0xbb)).unwrap();
        }
        Ok(())
    });
    let host = host_with(&backend, runtime);

    let reply = host
        .query(&envelope(&[("local", "onequery", Vec::new())]))
        .unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(decode_frames(&reply), vec![vec![2u8]]);
}

/// S4: a fork on every attempt exhausts the bound; no reply bytes escape.
#[test]
fn persistent_fork_fails_with_too_many_forks() {
    let backend = backend_with_chain(3);
    let attempts = Arc::new(AtomicU32::new(0));

    let counter = attempts.clone();
    let forker = backend.clone();
    let runtime = ScriptedRuntime::new(move |_path, host, guest| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
        guest.memory[0] = attempt as u8;
        host.set_output_data(guest, 0, 1)?;
        forker.add_block(block(3, 0xb0 + attempt as u8)).unwrap();
        Ok(())
    });
    let host = host_with(&backend, runtime);

    let err = host
        .query(&envelope(&[("local", "onequery", Vec::new())]))
        .unwrap_err();
    assert!(matches!(err, QueryError::TooManyForks));
    assert_eq!(attempts.load(Ordering::SeqCst), MAX_QUERY_ATTEMPTS);
}

/// S5: a fork after sub-request A restarts the whole request; the committed
/// frames all come from the post-fork attempt.
#[test]
fn fork_restarts_all_sub_requests() {
    let backend = backend_with_chain(3);
    let invocations = Arc::new(AtomicU32::new(0));

    let counter = invocations.clone();
    let forker = backend.clone();
    let runtime = ScriptedRuntime::new(move |_path, host, guest| {
        let invocation = counter.fetch_add(1, Ordering::SeqCst) + 1;
        guest.memory[0] = invocation as u8;
        host.set_output_data(guest, 0, 1)?;
        if invocation == 1 {
            forker.add_block(block(3, 0xcc)).unwrap();
        }
        Ok(())
    });
    let host = host_with(&backend, runtime);

    let request = envelope(&[
        ("local", "querya", Vec::new()),
        ("local", "queryb", Vec::new()),
    ]);
    let reply = host.query(&request).unwrap();

    // Attempt 1 ran only A (invocation 1) before the fork; attempt 2 ran A
    // and B as invocations 2 and 3.
    assert_eq!(invocations.load(Ordering::SeqCst), 3);
    assert_eq!(decode_frames(&reply), vec![vec![2u8], vec![3u8]]);
}

/// S6: the callback-allocation protocol, with the literal offsets from the
/// ABI contract: `cb_alloc_data = 0x1000`, guest allocator answers `0x2000`.
#[test]
fn callback_allocation_writes_at_the_guest_offset() {
    let backend = backend_with_chain(2);
    backend.set_irreversible(1).unwrap();
    let expected_status = DatabaseStatus {
        head: 2,
        head_id: Checksum256([2; 32]),
        irreversible: 1,
        irreversible_id: Checksum256([1; 32]),
        first: 1,
    }
    .encode_to_vec();

    let expected = expected_status.clone();
    let runtime = ScriptedRuntime::new(move |_path, host, guest| {
        guest.alloc = AllocBehavior::Fixed(0x2000);
        host.get_database_status(guest, 0x1000, CB_ALLOC_INDEX)?;

        let call = *guest.alloc_calls.last().expect("allocator was invoked");
        assert_eq!(call.cb_alloc_data, 0x1000);
        assert_eq!(call.size as usize, expected.len());
        assert_eq!(call.offset, 0x2000);
        assert_eq!(guest.last_delivery().unwrap(), expected);

        host.set_output_data(guest, 0x2000, 0x2000 + call.size)
    });
    let host = host_with(&backend, runtime);

    let reply = host
        .query(&envelope(&[("local", "status", Vec::new())]))
        .unwrap();
    assert_eq!(decode_frames(&reply), vec![expected_status]);
}

/// S6 (failure half): an out-of-bounds guest offset is `bad_memory`.
#[test]
fn out_of_bounds_allocation_aborts_the_request() {
    let backend = backend_with_chain(1);
    let runtime = ScriptedRuntime::new(|_path, host, guest| {
        guest.alloc = AllocBehavior::OutOfBounds;
        host.get_database_status(guest, 0, CB_ALLOC_INDEX)
    });
    let host = host_with(&backend, runtime);

    let err = host
        .query(&envelope(&[("local", "status", Vec::new())]))
        .unwrap_err();
    assert!(matches!(err, QueryError::Vm(VmError::BadMemory)));
}

/// S7: `eosio_assert_message(0, ...)` surfaces the guest message verbatim.
#[test]
fn assert_message_is_surfaced_verbatim() {
    let backend = backend_with_chain(1);
    let runtime = ScriptedRuntime::new(|_path, host, guest| {
        guest.memory[0x40..0x49].copy_from_slice(b"bad input");
        host.assert_message(guest, 0, 0x40, 9)
    });
    let host = host_with(&backend, runtime);

    let err = host
        .query(&envelope(&[("local", "asserts", Vec::new())]))
        .unwrap_err();
    match err {
        QueryError::Vm(VmError::Assert(message)) => assert_eq!(message, "bad input"),
        other => panic!("expected guest assert, got {other:?}"),
    }
}

#[test]
fn unknown_namespace_is_rejected() {
    let backend = backend_with_chain(1);
    let runtime = ScriptedRuntime::new(|_path, _host, _guest| {
        panic!("guest must not run for a rejected namespace")
    });
    let host = host_with(&backend, runtime);

    let err = host
        .query(&envelope(&[("remote", "block.info", Vec::new())]))
        .unwrap_err();
    match err {
        QueryError::UnknownNamespace(namespace) => assert_eq!(namespace, name("remote")),
        other => panic!("expected unknown namespace, got {other:?}"),
    }
}

/// The legacy path synthesizes `(target, request)` as the guest input, runs
/// the `legacy` module, and returns the raw guest output without framing.
#[test]
fn legacy_query_preserves_the_unframed_reply() {
    let backend = backend_with_chain(1);
    let runtime = ScriptedRuntime::new(|path, host, guest| {
        assert!(path.ends_with("legacy-server.wasm"));

        host.get_input_data(guest, 0, CB_ALLOC_INDEX)?;
        let input = guest.last_delivery().expect("input was delivered");
        let (target, rest) = String::decode_unfinished(&input).unwrap();
        let (request, rest) = Vec::<u8>::decode_unfinished(rest).unwrap();
        assert_eq!(target, "/v1/chain/get_table_rows");
        assert_eq!(request, b"{\"json\":true}");
        assert!(rest.is_empty());

        guest.memory[0..4].copy_from_slice(b"raw!");
        host.set_output_data(guest, 0, 4)
    });
    let host = host_with(&backend, runtime);

    let reply = host
        .legacy_query("/v1/chain/get_table_rows", b"{\"json\":true}")
        .unwrap();
    assert_eq!(reply, b"raw!");
}

/// Invariant 7: the top-level reply framing decodes back to the frames the
/// guests produced.
#[test]
fn reply_framing_round_trips() {
    let backend = backend_with_chain(1);
    let runtime = ScriptedRuntime::new(|_path, host, guest| {
        host.get_input_data(guest, 0, CB_ALLOC_INDEX)?;
        let (begin, len) = guest.last_alloc().expect("input was delivered");
        host.set_output_data(guest, begin, begin + len)
    });
    let host = host_with(&backend, runtime);

    let payloads: Vec<Vec<u8>> = vec![b"one".to_vec(), Vec::new(), vec![0; 300]];
    let subs: Vec<(&str, &str, Vec<u8>)> = payloads
        .iter()
        .map(|payload| ("local", "echo", payload.clone()))
        .collect();
    let reply = host.query(&envelope(&subs)).unwrap();
    assert_eq!(decode_frames(&reply), payloads);
}
