use quarry_wire::{WireDecode, WireDecodeError, WireEncode};
use serde::{Deserialize, Serialize};

use super::Checksum256;

/// Snapshot cursor delivered to guests through `get_database_status`.
///
/// Invariant: `first <= irreversible <= head` for any snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStatus {
    pub head: u32,
    pub head_id: Checksum256,
    pub irreversible: u32,
    pub irreversible_id: Checksum256,
    pub first: u32,
}

impl WireEncode for DatabaseStatus {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.head.encode(buf);
        self.head_id.encode(buf);
        self.irreversible.encode(buf);
        self.irreversible_id.encode(buf);
        self.first.encode(buf);
    }
}

impl WireDecode for DatabaseStatus {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (head, buf) = u32::decode_unfinished(buf)?;
        let (head_id, buf) = Checksum256::decode_unfinished(buf)?;
        let (irreversible, buf) = u32::decode_unfinished(buf)?;
        let (irreversible_id, buf) = Checksum256::decode_unfinished(buf)?;
        let (first, buf) = u32::decode_unfinished(buf)?;
        Ok((
            DatabaseStatus {
                head,
                head_id,
                irreversible,
                irreversible_id,
                first,
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
        let status = DatabaseStatus {
            head: 100,
            head_id: Checksum256([0xaa; 32]),
            irreversible: 90,
            irreversible_id: Checksum256([0xbb; 32]),
            first: 1,
        };
        let encoded = status.encode_to_vec();
        assert_eq!(encoded.len(), 4 + 32 + 4 + 32 + 4);
        assert_eq!(DatabaseStatus::decode(&encoded).unwrap(), status);
    }
}
