use std::sync::Arc;

use quarry_common::{Checksum256, DatabaseStatus};

use crate::api::StorageReadView;
use crate::error::StoreError;
use crate::executor;

/// A snapshot session: one pinned read view plus the status captured at
/// acquisition. Created per request attempt and dropped on every exit path.
pub struct QuerySession {
    view: Arc<dyn StorageReadView>,
    status: DatabaseStatus,
}

impl QuerySession {
    pub(crate) fn new(view: Arc<dyn StorageReadView>) -> Self {
        let status = view.status();
        QuerySession { view, status }
    }

    /// The snapshot's view at acquisition time.
    pub fn fill_status(&self) -> &DatabaseStatus {
        &self.status
    }

    /// The id recorded at `block_num` in this snapshot. Used for fork
    /// detection.
    pub fn get_block_id(&self, block_num: u32) -> Option<Checksum256> {
        self.view.block_id(block_num)
    }

    /// Parse and execute a range-query request blob, capped at
    /// `effective_max_block`.
    pub fn query_database(
        &self,
        request: &[u8],
        effective_max_block: u32,
    ) -> Result<Vec<u8>, StoreError> {
        executor::execute(self.view.as_ref(), request, effective_max_block)
    }
}
