use quarry_wire::{WireDecode, WireDecodeError, WireEncode};
use serde::{Deserialize, Serialize};

/// Microseconds since the unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePoint(pub i64);

/// Half-second block slots counted from 2000-01-01T00:00:00.000 UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockTimestamp(pub u32);

/// Milliseconds between the unix epoch and the block-timestamp epoch.
pub const BLOCK_TIMESTAMP_EPOCH_MS: u64 = 946_684_800_000;

/// Milliseconds per block slot.
pub const BLOCK_INTERVAL_MS: u64 = 500;

impl BlockTimestamp {
    pub fn to_unix_ms(self) -> u64 {
        BLOCK_TIMESTAMP_EPOCH_MS + u64::from(self.0) * BLOCK_INTERVAL_MS
    }
}

impl WireEncode for TimePoint {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.0.encode(buf);
    }
}

impl WireDecode for TimePoint {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (value, rest) = i64::decode_unfinished(buf)?;
        Ok((TimePoint(value), rest))
    }
}

impl WireEncode for BlockTimestamp {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.0.encode(buf);
    }
}

impl WireDecode for BlockTimestamp {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (value, rest) = u32::decode_unfinished(buf)?;
        Ok((BlockTimestamp(value), rest))
    }
}
