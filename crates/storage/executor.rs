//! Range executor: decodes a query request, streams matching rows from a
//! read view in key order, and packs the batched reply.

use quarry_common::keys::{CompositeKey, KeyField};
use quarry_common::{ActionTrace, ContractIndex64, ContractIndex64Row, ContractRow, Name, TransactionStatus};
use quarry_wire::{WireDecode, WireDecodeError, WireEncode, encode_varuint32};
use tracing::debug;

use crate::api::{StorageReadView, tables};
use crate::error::StoreError;
use crate::registry::{self, QueryMode, QuerySpec};

/// Execute one range-query request blob against a read view.
///
/// `effective_max_block` is the snapshot's cap (its head); a request asking
/// for more history than the snapshot holds is clamped to it. The reply is
/// the wire form of `vector<vector<byte>>`, one inner blob per row, in
/// strictly ascending key order.
pub fn execute(
    view: &dyn StorageReadView,
    request: &[u8],
    effective_max_block: u32,
) -> Result<Vec<u8>, StoreError> {
    let (query_name, rest) = Name::decode_unfinished(request)?;
    let spec = registry::lookup(query_name).ok_or(StoreError::UnknownQuery(query_name))?;

    let (req_max_block, rest) = if spec.has_max_block {
        u32::decode_unfinished(rest)?
    } else {
        (0, rest)
    };
    let (first, rest) = CompositeKey::decode_wire(spec.key_schema, rest)?;
    let (last, rest) = CompositeKey::decode_wire(spec.key_schema, rest)?;
    let (max_results, rest) = u32::decode_unfinished(rest)?;
    if !rest.is_empty() {
        return Err(WireDecodeError::TrailingBytes.into());
    }

    let max_block = req_max_block.min(effective_max_block);
    let cap = max_results.min(spec.max_results_cap) as usize;

    let rows = if cap == 0 || (spec.has_max_block && max_block == 0) {
        Vec::new()
    } else {
        match spec.mode {
            QueryMode::History => scan_history(view, spec, &first, &last, max_block, cap)?,
            QueryMode::LatestState => scan_latest(view, spec, &first, &last, max_block, cap)?,
        }
    };

    debug!(query = %query_name, rows = rows.len(), max_block, "range query served");
    Ok(encode_rows(&rows))
}

fn read_be_u32(bytes: &[u8], offset: usize) -> Result<u32, StoreError> {
    let slice = bytes
        .get(offset..offset + 4)
        .ok_or(WireDecodeError::UnexpectedEof)?;
    let array = slice
        .try_into()
        .map_err(|_| WireDecodeError::UnexpectedEof)?;
    Ok(u32::from_be_bytes(array))
}

/// Every record in range is a result, capped by `max_block` (when the key
/// carries a block index) and by the executed-only filter.
fn scan_history(
    view: &dyn StorageReadView,
    spec: &QuerySpec,
    first: &CompositeKey,
    last: &CompositeKey,
    max_block: u32,
    cap: usize,
) -> Result<Vec<Vec<u8>>, StoreError> {
    let first_bytes = first.storage_bytes();
    let last_bytes = last.storage_bytes();
    if first_bytes > last_bytes {
        return Ok(Vec::new());
    }

    let block_offset = spec.block_index_field.map(|pos| {
        spec.key_schema[..pos]
            .iter()
            .map(|kind| kind.key_len())
            .sum::<usize>()
    });

    let mut rows = Vec::new();
    for (key, value) in view.range(spec.table, &first_bytes, &last_bytes) {
        if let Some(offset) = block_offset {
            if read_be_u32(&key, offset)? > max_block {
                continue;
            }
        }
        if spec.executed_only {
            let trace = ActionTrace::decode(&value)?;
            if trace.transaction_status != TransactionStatus::Executed {
                continue;
            }
        }
        rows.push(value);
        if rows.len() == cap {
            break;
        }
    }
    Ok(rows)
}

/// Records are versions of a natural key; yield the latest version at or
/// below `max_block` per key, tombstones (`present = false`) included so
/// callers observe retraction.
fn scan_latest(
    view: &dyn StorageReadView,
    spec: &QuerySpec,
    first: &CompositeKey,
    last: &CompositeKey,
    max_block: u32,
    cap: usize,
) -> Result<Vec<Vec<u8>>, StoreError> {
    let nat_first = first.storage_bytes();
    let nat_last = last.storage_bytes();
    if nat_first > nat_last {
        return Ok(Vec::new());
    }
    let nat_len = nat_first.len();

    let mut lower = nat_first;
    lower.extend_from_slice(&0u32.to_be_bytes());
    let mut upper = nat_last;
    upper.extend_from_slice(&u32::MAX.to_be_bytes());

    let mut rows: Vec<Vec<u8>> = Vec::new();
    let mut group: Option<Vec<u8>> = None;
    let mut latest: Option<Vec<u8>> = None;

    for (key, value) in view.range(spec.table, &lower, &upper) {
        let nat = key
            .get(..nat_len)
            .ok_or(WireDecodeError::UnexpectedEof)?;
        let block_index = read_be_u32(&key, nat_len)?;

        if group.as_deref() != Some(nat) {
            if let Some(version) = latest.take() {
                rows.push(finish_row(view, spec, version, max_block)?);
                if rows.len() == cap {
                    return Ok(rows);
                }
            }
            group = Some(nat.to_vec());
        }
        // Versions within a group ascend by block, so the last one at or
        // below the cap wins.
        if block_index <= max_block {
            latest = Some(value);
        }
    }
    if let Some(version) = latest.take() {
        rows.push(finish_row(view, spec, version, max_block)?);
    }
    Ok(rows)
}

fn finish_row(
    view: &dyn StorageReadView,
    spec: &QuerySpec,
    value: Vec<u8>,
    max_block: u32,
) -> Result<Vec<u8>, StoreError> {
    if !spec.joins_contract_row {
        return Ok(value);
    }
    let entry = ContractIndex64::decode(&value)?;
    let row = latest_contract_row(view, &entry, max_block)?;
    Ok(ContractIndex64Row::join(entry, row.as_ref()).encode_to_vec())
}

/// The latest `contract_row` version at or below `max_block` for the table
/// position a secondary-index entry points at.
fn latest_contract_row(
    view: &dyn StorageReadView,
    entry: &ContractIndex64,
    max_block: u32,
) -> Result<Option<ContractRow>, StoreError> {
    let mut nat = Vec::with_capacity(8 * 4);
    entry.code.push_key_bytes(&mut nat);
    entry.table.push_key_bytes(&mut nat);
    entry.scope.push_key_bytes(&mut nat);
    entry.primary_key.push_key_bytes(&mut nat);

    let mut lower = nat.clone();
    lower.extend_from_slice(&0u32.to_be_bytes());
    let mut upper = nat;
    upper.extend_from_slice(&max_block.to_be_bytes());

    let latest = view
        .range(tables::CONTRACT_ROWS_CTSP, &lower, &upper)
        .last()
        .map(|(_, value)| value);
    latest.map(|value| Ok(ContractRow::decode(&value)?)).transpose()
}

fn encode_rows(rows: &[Vec<u8>]) -> Vec<u8> {
    let mut reply = Vec::new();
    encode_varuint32(rows.len() as u32, &mut reply);
    for row in rows {
        row.encode(&mut reply);
    }
    reply
}
