use quarry_common::Name;
use quarry_wire::WireDecodeError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown query: {0}")]
    UnknownQuery(Name),

    #[error(transparent)]
    Decode(#[from] WireDecodeError),

    #[error("failed to lock the store")]
    Lock,

    #[error("{0}")]
    Custom(String),
}
