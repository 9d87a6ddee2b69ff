//! Interfaces the query machinery consumes from the underlying column store.

pub mod tables;

use std::fmt::Debug;
use std::sync::Arc;

use quarry_common::{Checksum256, DatabaseStatus};

use crate::error::StoreError;

/// The column store that supplies read views.
///
/// Implementations are shared read-only across request threads; the store
/// guarantees a handed-out view stays stable irrespective of concurrent chain
/// ingestion.
pub trait StorageBackend: Debug + Send + Sync {
    /// Pin a consistent view of the history at the current head.
    fn read_view(&self) -> Result<Arc<dyn StorageReadView>, StoreError>;
}

/// A pinned, internally consistent view of the history database.
pub trait StorageReadView: Send + Sync {
    /// The snapshot cursor at acquisition time.
    fn status(&self) -> DatabaseStatus;

    /// The id recorded at `block_num` in this view, if the block is retained.
    fn block_id(&self, block_num: u32) -> Option<Checksum256>;

    /// Ordered scan of `table` over storage keys in `[first, last]`,
    /// inclusive on both ends.
    fn range<'a>(
        &'a self,
        table: &str,
        first: &[u8],
        last: &[u8],
    ) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;
}
