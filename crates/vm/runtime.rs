//! Interface to the embedded bytecode interpreter.
//!
//! The interpreter provides module loading, linear memory, import resolution,
//! and function invocation; the host never touches guest state except through
//! these traits.

use std::path::Path;

use crate::errors::VmError;
use crate::host::HostCallbacks;

/// Import namespace the host functions are resolved under.
pub const HOST_MODULE: &str = "env";

/// Exported entry points every guest module must provide, invoked in order.
/// Both take no arguments and return nothing.
pub const GUEST_EXPORTS: [&str; 2] = ["initialize", "run_query"];

/// A value crossing the host/guest boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuestValue {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

/// View of the running instance the interpreter exposes to host calls.
pub trait GuestContext {
    /// The instance's linear memory.
    fn memory(&mut self) -> &mut [u8];

    /// Invoke the guest function at `index` in the module's function table
    /// with two i32 arguments. The host only uses this for `cb_alloc`, and at
    /// most once per host call.
    fn call_indirect(&mut self, index: u32, args: (u32, u32)) -> Result<GuestValue, VmError>;
}

/// The interpreter as the driver sees it.
pub trait GuestRuntime: Send + Sync {
    /// Load the module at `module_path`, resolve its [`HOST_MODULE`] imports
    /// against `host`, and invoke the [`GUEST_EXPORTS`] in order. Host calls
    /// made by the guest are routed through [`HostCallbacks::dispatch`].
    fn run_query(&self, module_path: &Path, host: &mut HostCallbacks<'_>) -> Result<(), VmError>;
}
