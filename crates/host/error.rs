use quarry_common::Name;
use quarry_storage::StoreError;
use quarry_vm::VmError;
use quarry_wire::WireDecodeError;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The snapshot reports no head block; there is nothing to query.
    #[error("database is empty")]
    EmptyDatabase,

    /// The retry bound was exhausted without a fork-free attempt.
    #[error("too many fork events during request")]
    TooManyForks,

    /// A sub-request addressed a namespace other than `local`.
    #[error("unknown namespace: {0}")]
    UnknownNamespace(Name),

    #[error(transparent)]
    Vm(#[from] VmError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Decode(#[from] WireDecodeError),
}
