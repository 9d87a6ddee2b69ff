use bytes::Bytes;
use quarry_wire::{WireDecode, WireDecodeError, WireEncode};
use serde::{Deserialize, Serialize};

use super::{BlockTimestamp, Checksum256, Name, TimePoint};
use crate::serde_utils;

/// Time-sliced account state. `present = false` is a logical tombstone at
/// that block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub block_index: u32,
    pub present: bool,
    pub name: Name,
    pub vm_type: u8,
    pub vm_version: u8,
    pub privileged: bool,
    pub last_code_update: TimePoint,
    pub code_version: Checksum256,
    pub creation_date: BlockTimestamp,
    #[serde(with = "serde_utils::bytes_hex", default)]
    pub code: Bytes,
    #[serde(with = "serde_utils::bytes_hex", default)]
    pub abi: Bytes,
}

impl WireEncode for Account {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.block_index.encode(buf);
        self.present.encode(buf);
        self.name.encode(buf);
        self.vm_type.encode(buf);
        self.vm_version.encode(buf);
        self.privileged.encode(buf);
        self.last_code_update.encode(buf);
        self.code_version.encode(buf);
        self.creation_date.encode(buf);
        self.code.encode(buf);
        self.abi.encode(buf);
    }
}

impl WireDecode for Account {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (block_index, buf) = u32::decode_unfinished(buf)?;
        let (present, buf) = bool::decode_unfinished(buf)?;
        let (name, buf) = Name::decode_unfinished(buf)?;
        let (vm_type, buf) = u8::decode_unfinished(buf)?;
        let (vm_version, buf) = u8::decode_unfinished(buf)?;
        let (privileged, buf) = bool::decode_unfinished(buf)?;
        let (last_code_update, buf) = TimePoint::decode_unfinished(buf)?;
        let (code_version, buf) = Checksum256::decode_unfinished(buf)?;
        let (creation_date, buf) = BlockTimestamp::decode_unfinished(buf)?;
        let (code, buf) = Bytes::decode_unfinished(buf)?;
        let (abi, buf) = Bytes::decode_unfinished(buf)?;
        Ok((
            Account {
                block_index,
                present,
                name,
                vm_type,
                vm_version,
                privileged,
                last_code_update,
                code_version,
                creation_date,
                code,
                abi,
            },
            buf,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip() {
        let account = Account {
            block_index: 12,
            present: true,
            name: "alice".parse().unwrap(),
            vm_type: 0,
            vm_version: 0,
            privileged: false,
            last_code_update: TimePoint(1_600_000_000_000_000),
            code_version: Checksum256([9; 32]),
            creation_date: BlockTimestamp(500),
            code: Bytes::from_static(b"\0asm"),
            abi: Bytes::new(),
        };
        let encoded = account.encode_to_vec();
        assert_eq!(Account::decode(&encoded).unwrap(), account);
    }
}
