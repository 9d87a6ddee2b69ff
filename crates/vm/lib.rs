//! Host side of the guest sandbox.
//!
//! The bytecode interpreter itself is consumed through [`runtime::GuestRuntime`];
//! this crate supplies everything the host mounts into it: the bounds-checked
//! view of guest linear memory, the seven `env` host functions with their
//! callback-allocation protocol, and the module loader convention.

pub mod db;
pub mod errors;
pub mod host;
pub mod loader;
pub mod memory;
pub mod runtime;
pub mod test_utils;

pub use db::QueryDatabase;
pub use errors::VmError;
pub use host::HostCallbacks;
pub use runtime::{GuestContext, GuestRuntime, GuestValue};
