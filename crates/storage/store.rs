use std::sync::Arc;

use crate::api::StorageBackend;
use crate::error::StoreError;
use crate::session::QuerySession;

/// Handle to the history database. `Store` is `Clone` and thread-safe; all
/// clones share the same backend.
#[derive(Debug, Clone)]
pub struct Store {
    backend: Arc<dyn StorageBackend>,
}

impl Store {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Store {
            backend: Arc::new(backend),
        }
    }

    /// Pin a snapshot for one request attempt.
    pub fn create_query_session(&self) -> Result<QuerySession, StoreError> {
        Ok(QuerySession::new(self.backend.read_view()?))
    }
}
