use std::fmt;
use std::str::FromStr;

use quarry_wire::{WireDecode, WireDecodeError, WireEncode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 256-bit digest. Serializes as 32 raw bytes on the wire and as a hex
/// string in text forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checksum256(pub [u8; 32]);

impl Checksum256 {
    pub const ZERO: Checksum256 = Checksum256([0; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Treating the digest as a 256-bit big-endian integer, add one.
    /// Returns true if the value wrapped to zero.
    pub fn increment(&mut self) -> bool {
        for byte in self.0.iter_mut().rev() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                return false;
            }
        }
        true
    }
}

impl From<[u8; 32]> for Checksum256 {
    fn from(bytes: [u8; 32]) -> Self {
        Checksum256(bytes)
    }
}

impl fmt::Display for Checksum256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid checksum256: expected 64 hex characters")]
pub struct InvalidChecksum;

impl FromStr for Checksum256 {
    type Err = InvalidChecksum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|_| InvalidChecksum)?;
        let array: [u8; 32] = bytes.try_into().map_err(|_| InvalidChecksum)?;
        Ok(Checksum256(array))
    }
}

impl WireEncode for Checksum256 {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.0.encode(buf);
    }
}

impl WireDecode for Checksum256 {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (bytes, rest) = <[u8; 32]>::decode_unfinished(buf)?;
        Ok((Checksum256(bytes), rest))
    }
}

impl Serialize for Checksum256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Checksum256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let digest = Checksum256([0x11; 32]);
        let text = digest.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<Checksum256>().unwrap(), digest);
    }

    #[test]
    fn increment_carries_from_the_low_byte() {
        let mut digest = Checksum256::ZERO;
        assert!(!digest.increment());
        assert_eq!(digest.0[31], 1);

        let mut carry = Checksum256([0; 32]);
        carry.0[31] = 0xff;
        assert!(!carry.increment());
        assert_eq!(carry.0[30], 1);
        assert_eq!(carry.0[31], 0);
    }

    #[test]
    fn increment_wraps_at_the_maximum() {
        let mut max = Checksum256([0xff; 32]);
        assert!(max.increment());
        assert_eq!(max, Checksum256::ZERO);
    }

    #[test]
    fn wire_form_is_raw_bytes() {
        let digest = Checksum256([0xab; 32]);
        let encoded = digest.encode_to_vec();
        assert_eq!(encoded, vec![0xab; 32]);
        assert_eq!(Checksum256::decode(&encoded).unwrap(), digest);
    }
}
