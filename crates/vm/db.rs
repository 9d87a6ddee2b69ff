use crate::errors::VmError;

/// The snapshot session as the host-call bridge sees it. The driver supplies
/// an adapter over the real session so this crate never depends on the store.
pub trait QueryDatabase {
    /// Execute a guest-built range-query request, capped at `max_block`.
    fn query(&self, request: &[u8], max_block: u32) -> Result<Vec<u8>, VmError>;
}
