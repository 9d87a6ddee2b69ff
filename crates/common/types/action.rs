use bytes::Bytes;
use quarry_wire::{
    WireDecode, WireDecodeError, WireEncode, decode_varuint32, encode_varuint32,
};
use serde::{Deserialize, Serialize};

use super::{Checksum256, Name};
use crate::serde_utils;

/// Outcome of the transaction an action belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TransactionStatus {
    /// Succeeded, no error handler executed.
    #[default]
    Executed = 0,
    /// Objectively failed, error handler executed.
    SoftFail = 1,
    /// Objectively failed and error handler objectively failed.
    HardFail = 2,
    /// Delayed/deferred/scheduled for future execution.
    Delayed = 3,
    /// Expired, storage space refunded.
    Expired = 4,
}

impl TryFrom<u8> for TransactionStatus {
    type Error = WireDecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TransactionStatus::Executed),
            1 => Ok(TransactionStatus::SoftFail),
            2 => Ok(TransactionStatus::HardFail),
            3 => Ok(TransactionStatus::Delayed),
            4 => Ok(TransactionStatus::Expired),
            other => Err(WireDecodeError::Custom(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

impl WireEncode for TransactionStatus {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        (*self as u8).encode(buf);
    }
}

impl WireDecode for TransactionStatus {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (byte, rest) = u8::decode_unfinished(buf)?;
        Ok((TransactionStatus::try_from(byte)?, rest))
    }
}

/// Record of one action's execution within a transaction.
///
/// `receipt_code_sequence` and `receipt_abi_sequence` travel as varuint32 on
/// the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTrace {
    pub block_index: u32,
    pub transaction_id: Checksum256,
    pub action_index: u32,
    pub parent_action_index: u32,
    pub transaction_status: TransactionStatus,
    pub receipt_receiver: Name,
    pub receipt_act_digest: Checksum256,
    pub receipt_global_sequence: u64,
    pub receipt_recv_sequence: u64,
    pub receipt_code_sequence: u32,
    pub receipt_abi_sequence: u32,
    pub account: Name,
    pub name: Name,
    #[serde(with = "serde_utils::bytes_hex", default)]
    pub data: Bytes,
    pub context_free: bool,
    pub elapsed: i64,
}

impl WireEncode for ActionTrace {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.block_index.encode(buf);
        self.transaction_id.encode(buf);
        self.action_index.encode(buf);
        self.parent_action_index.encode(buf);
        self.transaction_status.encode(buf);
        self.receipt_receiver.encode(buf);
        self.receipt_act_digest.encode(buf);
        self.receipt_global_sequence.encode(buf);
        self.receipt_recv_sequence.encode(buf);
        encode_varuint32(self.receipt_code_sequence, buf);
        encode_varuint32(self.receipt_abi_sequence, buf);
        self.account.encode(buf);
        self.name.encode(buf);
        self.data.encode(buf);
        self.context_free.encode(buf);
        self.elapsed.encode(buf);
    }
}

impl WireDecode for ActionTrace {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (block_index, buf) = u32::decode_unfinished(buf)?;
        let (transaction_id, buf) = Checksum256::decode_unfinished(buf)?;
        let (action_index, buf) = u32::decode_unfinished(buf)?;
        let (parent_action_index, buf) = u32::decode_unfinished(buf)?;
        let (transaction_status, buf) = TransactionStatus::decode_unfinished(buf)?;
        let (receipt_receiver, buf) = Name::decode_unfinished(buf)?;
        let (receipt_act_digest, buf) = Checksum256::decode_unfinished(buf)?;
        let (receipt_global_sequence, buf) = u64::decode_unfinished(buf)?;
        let (receipt_recv_sequence, buf) = u64::decode_unfinished(buf)?;
        let (receipt_code_sequence, buf) = decode_varuint32(buf)?;
        let (receipt_abi_sequence, buf) = decode_varuint32(buf)?;
        let (account, buf) = Name::decode_unfinished(buf)?;
        let (name, buf) = Name::decode_unfinished(buf)?;
        let (data, buf) = Bytes::decode_unfinished(buf)?;
        let (context_free, buf) = bool::decode_unfinished(buf)?;
        let (elapsed, buf) = i64::decode_unfinished(buf)?;
        Ok((
            ActionTrace {
                block_index,
                transaction_id,
                action_index,
                parent_action_index,
                transaction_status,
                receipt_receiver,
                receipt_act_digest,
                receipt_global_sequence,
                receipt_recv_sequence,
                receipt_code_sequence,
                receipt_abi_sequence,
                account,
                name,
                data,
                context_free,
                elapsed,
            },
            buf,
        ))
    }
}
