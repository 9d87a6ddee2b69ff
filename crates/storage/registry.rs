//! The closed catalog of range-query variants.
//!
//! Each variant is declarative data: its short name, the table it scans, the
//! key schema that defines its ordering, and how records are selected.
//! Adding a variant is one more [`QuerySpec`] row; there are no per-variant
//! code paths in the executor beyond the contract-row join.

use quarry_common::Name;
use quarry_common::keys::KeyFieldKind;

/// How the executor selects records within a key range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Every record in range is a result (subject to filters).
    History,
    /// Records are versions of a natural key; only the latest version at or
    /// below `max_block` is a result, tombstones included.
    LatestState,
}

#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub name: Name,
    pub table: &'static str,
    pub key_schema: &'static [KeyFieldKind],
    pub mode: QueryMode,
    /// Whether the request carries a `max_block` field (`block.info` does not).
    pub has_max_block: bool,
    /// Position of `block_index` within the key schema, for history variants
    /// whose records are capped by `max_block`.
    pub block_index_field: Option<usize>,
    /// Only yield actions from executed transactions.
    pub executed_only: bool,
    /// Join each result to the latest matching contract row.
    pub joins_contract_row: bool,
    /// Server-side result cap, applied on top of the request's `max_results`.
    pub max_results_cap: u32,
}

use KeyFieldKind::{Checksum256, Name as NameKey, U32, U64};

pub const QUERIES: &[QuerySpec] = &[
    QuerySpec {
        name: Name::from_static("block.info"),
        table: crate::api::tables::BLOCK_INFO,
        key_schema: &[U32],
        mode: QueryMode::History,
        has_max_block: false,
        block_index_field: None,
        executed_only: false,
        joins_contract_row: false,
        max_results_cap: 100,
    },
    QuerySpec {
        name: Name::from_static("at.e.nra"),
        table: crate::api::tables::ACTION_TRACES,
        key_schema: &[NameKey, NameKey, NameKey, U32, Checksum256, U32],
        mode: QueryMode::History,
        has_max_block: true,
        block_index_field: Some(3),
        executed_only: true,
        joins_contract_row: false,
        max_results_cap: 100,
    },
    QuerySpec {
        name: Name::from_static("account"),
        table: crate::api::tables::ACCOUNTS,
        key_schema: &[NameKey],
        mode: QueryMode::LatestState,
        has_max_block: true,
        block_index_field: None,
        executed_only: false,
        joins_contract_row: false,
        max_results_cap: 100,
    },
    QuerySpec {
        name: Name::from_static("cr.ctps"),
        table: crate::api::tables::CONTRACT_ROWS_CTPS,
        key_schema: &[NameKey, NameKey, U64, U64],
        mode: QueryMode::LatestState,
        has_max_block: true,
        block_index_field: None,
        executed_only: false,
        joins_contract_row: false,
        max_results_cap: 100,
    },
    QuerySpec {
        name: Name::from_static("cr.ctsp"),
        table: crate::api::tables::CONTRACT_ROWS_CTSP,
        key_schema: &[NameKey, NameKey, U64, U64],
        mode: QueryMode::LatestState,
        has_max_block: true,
        block_index_field: None,
        executed_only: false,
        joins_contract_row: false,
        max_results_cap: 100,
    },
    QuerySpec {
        name: Name::from_static("cr.stpc"),
        table: crate::api::tables::CONTRACT_ROWS_STPC,
        key_schema: &[U64, NameKey, U64, NameKey],
        mode: QueryMode::LatestState,
        has_max_block: true,
        block_index_field: None,
        executed_only: false,
        joins_contract_row: false,
        max_results_cap: 100,
    },
    // Secondary-index variants for widths other than u64 stay reserved until
    // their schemas are confirmed.
    QuerySpec {
        name: Name::from_static("ci1.cts2p"),
        table: crate::api::tables::CONTRACT_INDEX64,
        key_schema: &[NameKey, NameKey, U64, U64, U64],
        mode: QueryMode::LatestState,
        has_max_block: true,
        block_index_field: None,
        executed_only: false,
        joins_contract_row: true,
        max_results_cap: 100,
    },
];

pub fn lookup(name: Name) -> Option<&'static QuerySpec> {
    QUERIES.iter().find(|spec| spec.name == name)
}
