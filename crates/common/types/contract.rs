use bytes::Bytes;
use quarry_wire::{WireDecode, WireDecodeError, WireEncode};
use serde::{Deserialize, Serialize};

use super::Name;
use crate::serde_utils;

/// A single row of a smart-contract table at a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRow {
    pub block_index: u32,
    pub present: bool,
    pub code: Name,
    pub scope: u64,
    pub table: Name,
    pub primary_key: u64,
    pub payer: Name,
    #[serde(with = "serde_utils::bytes_hex", default)]
    pub value: Bytes,
}

impl WireEncode for ContractRow {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.block_index.encode(buf);
        self.present.encode(buf);
        self.code.encode(buf);
        self.scope.encode(buf);
        self.table.encode(buf);
        self.primary_key.encode(buf);
        self.payer.encode(buf);
        self.value.encode(buf);
    }
}

impl WireDecode for ContractRow {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (block_index, buf) = u32::decode_unfinished(buf)?;
        let (present, buf) = bool::decode_unfinished(buf)?;
        let (code, buf) = Name::decode_unfinished(buf)?;
        let (scope, buf) = u64::decode_unfinished(buf)?;
        let (table, buf) = Name::decode_unfinished(buf)?;
        let (primary_key, buf) = u64::decode_unfinished(buf)?;
        let (payer, buf) = Name::decode_unfinished(buf)?;
        let (value, buf) = Bytes::decode_unfinished(buf)?;
        Ok((
            ContractRow {
                block_index,
                present,
                code,
                scope,
                table,
                primary_key,
                payer,
                value,
            },
            buf,
        ))
    }
}

/// A u64 secondary-index entry for a contract-table row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractIndex64 {
    pub block_index: u32,
    pub present: bool,
    pub code: Name,
    pub scope: u64,
    pub table: Name,
    pub primary_key: u64,
    pub payer: Name,
    pub secondary_key: u64,
}

impl WireEncode for ContractIndex64 {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.block_index.encode(buf);
        self.present.encode(buf);
        self.code.encode(buf);
        self.scope.encode(buf);
        self.table.encode(buf);
        self.primary_key.encode(buf);
        self.payer.encode(buf);
        self.secondary_key.encode(buf);
    }
}

impl WireDecode for ContractIndex64 {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (block_index, buf) = u32::decode_unfinished(buf)?;
        let (present, buf) = bool::decode_unfinished(buf)?;
        let (code, buf) = Name::decode_unfinished(buf)?;
        let (scope, buf) = u64::decode_unfinished(buf)?;
        let (table, buf) = Name::decode_unfinished(buf)?;
        let (primary_key, buf) = u64::decode_unfinished(buf)?;
        let (payer, buf) = Name::decode_unfinished(buf)?;
        let (secondary_key, buf) = u64::decode_unfinished(buf)?;
        Ok((
            ContractIndex64 {
                block_index,
                present,
                code,
                scope,
                table,
                primary_key,
                payer,
                secondary_key,
            },
            buf,
        ))
    }
}

/// A secondary-index entry joined to its row projection. This is the row type
/// served by the `ci1.cts2p` query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractIndex64Row {
    pub block_index: u32,
    pub present: bool,
    pub code: Name,
    pub scope: u64,
    pub table: Name,
    pub primary_key: u64,
    pub payer: Name,
    pub secondary_key: u64,
    pub row_block_index: u32,
    pub row_present: bool,
    pub row_payer: Name,
    #[serde(with = "serde_utils::bytes_hex", default)]
    pub row_value: Bytes,
}

impl ContractIndex64Row {
    /// Join an index entry to the row projection it points at. A missing row
    /// leaves the projection fields at their defaults with
    /// `row_present = false`.
    pub fn join(entry: ContractIndex64, row: Option<&ContractRow>) -> Self {
        let (row_block_index, row_present, row_payer, row_value) = match row {
            Some(row) => (row.block_index, row.present, row.payer, row.value.clone()),
            None => (0, false, Name::default(), Bytes::new()),
        };
        ContractIndex64Row {
            block_index: entry.block_index,
            present: entry.present,
            code: entry.code,
            scope: entry.scope,
            table: entry.table,
            primary_key: entry.primary_key,
            payer: entry.payer,
            secondary_key: entry.secondary_key,
            row_block_index,
            row_present,
            row_payer,
            row_value,
        }
    }
}

impl WireEncode for ContractIndex64Row {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.block_index.encode(buf);
        self.present.encode(buf);
        self.code.encode(buf);
        self.scope.encode(buf);
        self.table.encode(buf);
        self.primary_key.encode(buf);
        self.payer.encode(buf);
        self.secondary_key.encode(buf);
        self.row_block_index.encode(buf);
        self.row_present.encode(buf);
        self.row_payer.encode(buf);
        self.row_value.encode(buf);
    }
}

impl WireDecode for ContractIndex64Row {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (entry, buf) = ContractIndex64::decode_unfinished(buf)?;
        let (row_block_index, buf) = u32::decode_unfinished(buf)?;
        let (row_present, buf) = bool::decode_unfinished(buf)?;
        let (row_payer, buf) = Name::decode_unfinished(buf)?;
        let (row_value, buf) = Bytes::decode_unfinished(buf)?;
        Ok((
            ContractIndex64Row {
                block_index: entry.block_index,
                present: entry.present,
                code: entry.code,
                scope: entry.scope,
                table: entry.table,
                primary_key: entry.primary_key,
                payer: entry.payer,
                secondary_key: entry.secondary_key,
                row_block_index,
                row_present,
                row_payer,
                row_value,
            },
            buf,
        ))
    }
}
