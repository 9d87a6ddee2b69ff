//! Core types shared across the quarry workspace: packed names, digests,
//! history records, and the composite-key codec that defines range-query
//! ordering.

pub mod keys;
pub mod serde_utils;
pub mod types;

pub use types::{
    Account, ActionTrace, BlockInfo, BlockTimestamp, Checksum256, ContractIndex64,
    ContractIndex64Row, ContractRow, DatabaseStatus, InvalidName, Name, TimePoint,
    TransactionStatus,
};
