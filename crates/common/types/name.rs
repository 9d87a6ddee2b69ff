use std::fmt;
use std::str::FromStr;

use quarry_wire::{WireDecode, WireDecodeError, WireEncode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 64-bit packed identifier over the alphabet `.12345a-z`.
///
/// Up to 13 characters: the first 12 take five bits each (most significant
/// first), the 13th takes the low four bits and is restricted to `.1-5a-j`.
/// Trailing dots are not part of the textual form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(pub u64);

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid name {name:?}: {reason}")]
pub struct InvalidName {
    pub name: String,
    pub reason: &'static str,
}

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some(u64::from(c - b'a') + 6),
        b'1'..=b'5' => Some(u64::from(c - b'1') + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl Name {
    pub const fn new(value: u64) -> Self {
        Name(value)
    }

    /// Pack a name literal at compile time. Panics (at const-eval) on input
    /// `FromStr` would reject; only use with known-good literals.
    pub const fn from_static(s: &str) -> Name {
        let bytes = s.as_bytes();
        assert!(bytes.len() <= 13, "name longer than 13 characters");
        let mut value: u64 = 0;
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            let sym = match c {
                b'a'..=b'z' => (c - b'a') as u64 + 6,
                b'1'..=b'5' => (c - b'1') as u64 + 1,
                b'.' => 0,
                _ => panic!("name character outside .12345a-z"),
            };
            if i < 12 {
                value |= (sym & 0x1f) << (64 - 5 * (i as u64 + 1));
            } else {
                assert!(sym <= 0x0f, "13th name character outside .1-5a-j");
                value |= sym;
            }
            i += 1;
        }
        Name(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// The next name in key order. Returns `(successor, wrapped)`.
    pub fn successor(self) -> (Name, bool) {
        let next = self.0.wrapping_add(1);
        (Name(next), next == 0)
    }
}

impl FromStr for Name {
    type Err = InvalidName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| InvalidName {
            name: s.to_string(),
            reason,
        };
        if s.len() > 13 {
            return Err(invalid("longer than 13 characters"));
        }
        let mut value: u64 = 0;
        for (i, &c) in s.as_bytes().iter().enumerate() {
            let sym = char_to_symbol(c).ok_or_else(|| invalid("character outside .12345a-z"))?;
            if i < 12 {
                value |= (sym & 0x1f) << (64 - 5 * (i as u64 + 1));
            } else {
                if sym > 0x0f {
                    return Err(invalid("13th character outside .1-5a-j"));
                }
                value |= sym;
            }
        }
        Ok(Name(value))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = [b'.'; 13];
        let mut tmp = self.0;
        for i in 0..13 {
            let mask: u64 = if i == 0 { 0x0f } else { 0x1f };
            chars[12 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= if i == 0 { 4 } else { 5 };
        }
        let text = std::str::from_utf8(&chars).unwrap_or(".............");
        f.write_str(text.trim_end_matches('.'))
    }
}

impl WireEncode for Name {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.0.encode(buf);
    }
}

impl WireDecode for Name {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (value, rest) = u64::decode_unfinished(buf)?;
        Ok((Name(value), rest))
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
