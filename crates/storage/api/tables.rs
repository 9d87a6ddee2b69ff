//! Table names used by the query machinery.
//!
//! History tables key each record by the full variant key; state tables key
//! by `natural key ++ block_index` so a scan visits every version of a
//! natural key in block order. All key fields use their canonical big-endian
//! encodings.

/// Block summaries: [`u8;4`] => [`Vec<u8>`]
/// - [`u8;4`] = `block_num.to_be_bytes()`
/// - [`Vec<u8>`] = `block_info.encode_to_vec()`
pub const BLOCK_INFO: &str = "block_info";

/// Action traces: [`Vec<u8>`] => [`Vec<u8>`]
/// - [`Vec<u8>`] = `(name, receipt_receiver, account, block_index, transaction_id, action_index)` key bytes
/// - [`Vec<u8>`] = `action_trace.encode_to_vec()`
pub const ACTION_TRACES: &str = "action_traces";

/// Account versions: [`Vec<u8>`] => [`Vec<u8>`]
/// - [`Vec<u8>`] = `(name)` key bytes ++ `block_index.to_be_bytes()`
/// - [`Vec<u8>`] = `account.encode_to_vec()`
pub const ACCOUNTS: &str = "accounts";

/// Contract rows ordered (code, table, primary_key, scope): [`Vec<u8>`] => [`Vec<u8>`]
/// - [`Vec<u8>`] = `(code, table, primary_key, scope)` key bytes ++ `block_index.to_be_bytes()`
/// - [`Vec<u8>`] = `contract_row.encode_to_vec()`
pub const CONTRACT_ROWS_CTPS: &str = "contract_rows_ctps";

/// Contract rows ordered (code, table, scope, primary_key): [`Vec<u8>`] => [`Vec<u8>`]
/// - [`Vec<u8>`] = `(code, table, scope, primary_key)` key bytes ++ `block_index.to_be_bytes()`
/// - [`Vec<u8>`] = `contract_row.encode_to_vec()`
pub const CONTRACT_ROWS_CTSP: &str = "contract_rows_ctsp";

/// Contract rows ordered (scope, table, primary_key, code): [`Vec<u8>`] => [`Vec<u8>`]
/// - [`Vec<u8>`] = `(scope, table, primary_key, code)` key bytes ++ `block_index.to_be_bytes()`
/// - [`Vec<u8>`] = `contract_row.encode_to_vec()`
pub const CONTRACT_ROWS_STPC: &str = "contract_rows_stpc";

/// u64 secondary-index entries: [`Vec<u8>`] => [`Vec<u8>`]
/// - [`Vec<u8>`] = `(code, table, scope, secondary_key, primary_key)` key bytes ++ `block_index.to_be_bytes()`
/// - [`Vec<u8>`] = `contract_index64.encode_to_vec()`
pub const CONTRACT_INDEX64: &str = "contract_index64";

pub const TABLES: [&str; 7] = [
    BLOCK_INFO,
    ACTION_TRACES,
    ACCOUNTS,
    CONTRACT_ROWS_CTPS,
    CONTRACT_ROWS_CTSP,
    CONTRACT_ROWS_STPC,
    CONTRACT_INDEX64,
];
