//! Scripted guest machinery for tests: a fake instance with real linear
//! memory and a programmable allocator, plus a [`GuestRuntime`] whose module
//! behavior is a Rust closure.

use std::path::Path;

use crate::db::QueryDatabase;
use crate::errors::VmError;
use crate::host::HostCallbacks;
use crate::runtime::{GuestContext, GuestRuntime, GuestValue};

/// Function-table index the fake guest exposes its allocator at.
pub const CB_ALLOC_INDEX: u32 = 1;

/// What the fake guest's allocator does when the host calls it.
#[derive(Debug, Clone, Copy)]
pub enum AllocBehavior {
    /// Bump-allocate from a cursor, 8-byte aligned.
    Bump,
    /// Always return the same offset.
    Fixed(u32),
    /// Return an offset past the end of linear memory.
    OutOfBounds,
    /// Return an i64 instead of an i32.
    WrongType,
}

/// One observed `cb_alloc` invocation.
#[derive(Debug, Clone, Copy)]
pub struct AllocCall {
    pub cb_alloc_data: u32,
    pub size: u32,
    /// The offset the allocator answered with.
    pub offset: u32,
}

/// A guest instance stand-in: linear memory plus an allocator in the
/// function table.
pub struct FakeGuest {
    pub memory: Vec<u8>,
    pub alloc: AllocBehavior,
    pub alloc_calls: Vec<AllocCall>,
    cursor: u32,
}

impl FakeGuest {
    pub fn new(memory_size: usize) -> Self {
        Self::with_alloc(memory_size, AllocBehavior::Bump)
    }

    pub fn with_alloc(memory_size: usize, alloc: AllocBehavior) -> Self {
        FakeGuest {
            memory: vec![0; memory_size],
            alloc,
            alloc_calls: Vec::new(),
            cursor: 0x100,
        }
    }

    /// The most recent allocation, as `(offset, size)`.
    pub fn last_alloc(&self) -> Option<(u32, u32)> {
        self.alloc_calls.last().map(|call| (call.offset, call.size))
    }

    /// Copy the most recently delivered payload back out of guest memory.
    pub fn last_delivery(&self) -> Option<Vec<u8>> {
        self.last_alloc().map(|(offset, size)| {
            self.memory[offset as usize..(offset + size) as usize].to_vec()
        })
    }
}

impl GuestContext for FakeGuest {
    fn memory(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn call_indirect(&mut self, index: u32, args: (u32, u32)) -> Result<GuestValue, VmError> {
        if index != CB_ALLOC_INDEX {
            return Err(VmError::Trap(format!("no function at table index {index}")));
        }
        let (cb_alloc_data, size) = args;
        let offset = match self.alloc {
            AllocBehavior::Bump => {
                let offset = self.cursor;
                self.cursor = self.cursor.saturating_add(size).next_multiple_of(8);
                offset
            }
            AllocBehavior::Fixed(offset) => offset,
            AllocBehavior::OutOfBounds => self.memory.len() as u32,
            AllocBehavior::WrongType => {
                self.alloc_calls.push(AllocCall {
                    cb_alloc_data,
                    size,
                    offset: 0,
                });
                return Ok(GuestValue::I64(0));
            }
        };
        self.alloc_calls.push(AllocCall {
            cb_alloc_data,
            size,
            offset,
        });
        Ok(GuestValue::I32(offset as i32))
    }
}

/// A [`QueryDatabase`] that fails every query; for host-call tests that never
/// reach the session.
pub struct NullDatabase;

impl QueryDatabase for NullDatabase {
    fn query(&self, _request: &[u8], _max_block: u32) -> Result<Vec<u8>, VmError> {
        Err(VmError::Database("no database attached".to_string()))
    }
}

type Script =
    dyn Fn(&Path, &mut HostCallbacks<'_>, &mut FakeGuest) -> Result<(), VmError> + Send + Sync;

/// A guest runtime whose module behavior is a closure. Each `run_query`
/// builds a fresh [`FakeGuest`], mirroring per-invocation instantiation.
pub struct ScriptedRuntime {
    memory_size: usize,
    script: Box<Script>,
}

impl ScriptedRuntime {
    pub fn new(
        script: impl Fn(&Path, &mut HostCallbacks<'_>, &mut FakeGuest) -> Result<(), VmError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        ScriptedRuntime {
            memory_size: 0x1_0000,
            script: Box::new(script),
        }
    }

    /// The canonical well-behaved guest: fetch the input, forward it to
    /// `query_database`, and write the query reply as the output.
    pub fn echo_query() -> Self {
        Self::new(|_path, host, guest| {
            host.get_input_data(guest, 0, CB_ALLOC_INDEX)?;
            let (req_begin, req_len) = guest
                .last_alloc()
                .ok_or_else(|| VmError::Trap("no input delivered".to_string()))?;
            host.query_database(
                guest,
                req_begin,
                req_begin + req_len,
                0,
                CB_ALLOC_INDEX,
            )?;
            let (reply_begin, reply_len) = guest
                .last_alloc()
                .ok_or_else(|| VmError::Trap("no reply delivered".to_string()))?;
            host.set_output_data(guest, reply_begin, reply_begin + reply_len)
        })
    }
}

impl GuestRuntime for ScriptedRuntime {
    fn run_query(&self, module_path: &Path, host: &mut HostCallbacks<'_>) -> Result<(), VmError> {
        let mut guest = FakeGuest::new(self.memory_size);
        (self.script)(module_path, host, &mut guest)
    }
}
