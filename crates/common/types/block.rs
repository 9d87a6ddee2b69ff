use quarry_wire::{WireDecode, WireDecodeError, WireEncode};
use serde::{Deserialize, Serialize};

use super::{BlockTimestamp, Checksum256, Name};

/// Immutable summary of a finalized block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub block_num: u32,
    pub block_id: Checksum256,
    pub timestamp: BlockTimestamp,
    pub producer: Name,
    pub confirmed: u16,
    pub previous: Checksum256,
    pub transaction_mroot: Checksum256,
    pub action_mroot: Checksum256,
    pub schedule_version: u32,
    pub new_producers_version: u32,
}

impl WireEncode for BlockInfo {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.block_num.encode(buf);
        self.block_id.encode(buf);
        self.timestamp.encode(buf);
        self.producer.encode(buf);
        self.confirmed.encode(buf);
        self.previous.encode(buf);
        self.transaction_mroot.encode(buf);
        self.action_mroot.encode(buf);
        self.schedule_version.encode(buf);
        self.new_producers_version.encode(buf);
    }
}

impl WireDecode for BlockInfo {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (block_num, buf) = u32::decode_unfinished(buf)?;
        let (block_id, buf) = Checksum256::decode_unfinished(buf)?;
        let (timestamp, buf) = BlockTimestamp::decode_unfinished(buf)?;
        let (producer, buf) = Name::decode_unfinished(buf)?;
        let (confirmed, buf) = u16::decode_unfinished(buf)?;
        let (previous, buf) = Checksum256::decode_unfinished(buf)?;
        let (transaction_mroot, buf) = Checksum256::decode_unfinished(buf)?;
        let (action_mroot, buf) = Checksum256::decode_unfinished(buf)?;
        let (schedule_version, buf) = u32::decode_unfinished(buf)?;
        let (new_producers_version, buf) = u32::decode_unfinished(buf)?;
        Ok((
            BlockInfo {
                block_num,
                block_id,
                timestamp,
                producer,
                confirmed,
                previous,
                transaction_mroot,
                action_mroot,
                schedule_version,
                new_producers_version,
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
        let info = BlockInfo {
            block_num: 42,
            block_id: Checksum256([0x42; 32]),
            timestamp: BlockTimestamp(1_000),
            producer: "producer".parse().unwrap(),
            confirmed: 3,
            previous: Checksum256([0x41; 32]),
            transaction_mroot: Checksum256([1; 32]),
            action_mroot: Checksum256([2; 32]),
            schedule_version: 7,
            new_producers_version: 0,
        };
        let encoded = info.encode_to_vec();
        assert_eq!(BlockInfo::decode(&encoded).unwrap(), info);
    }
}
