//! Composite-key codec for range queries.
//!
//! Every range-query variant declares its key as an ordered tuple of typed
//! fields. The concatenation of per-field canonical big-endian encodings
//! defines the total order used by the history tables, and the successor of a
//! composite key is the right-to-left carry chain: increment the last field
//! and, only on wrap, carry into the field before it. Callers rely on that
//! carry order to construct open-ended ranges.

use quarry_wire::{WireDecode, WireDecodeError, WireEncode};

use crate::types::{Checksum256, Name};

/// A single key field: canonical big-endian encoding plus a successor.
/// `increment` returns true when the value wrapped to zero.
pub trait KeyField {
    fn push_key_bytes(&self, out: &mut Vec<u8>);
    fn increment(&mut self) -> bool;
}

macro_rules! impl_uint_key_field {
    ($($t:ty),*) => {
        $(impl KeyField for $t {
            fn push_key_bytes(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_be_bytes());
            }

            fn increment(&mut self) -> bool {
                *self = self.wrapping_add(1);
                *self == 0
            }
        })*
    };
}

impl_uint_key_field!(u8, u16, u32, u64, u128);

impl KeyField for Name {
    fn push_key_bytes(&self, out: &mut Vec<u8>) {
        self.0.push_key_bytes(out);
    }

    fn increment(&mut self) -> bool {
        self.0.increment()
    }
}

impl KeyField for Checksum256 {
    fn push_key_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }

    fn increment(&mut self) -> bool {
        Checksum256::increment(self)
    }
}

/// Field type in a declarative key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFieldKind {
    U32,
    U64,
    U128,
    Name,
    Checksum256,
}

impl KeyFieldKind {
    /// Width of the canonical encoding in bytes.
    pub fn key_len(self) -> usize {
        match self {
            KeyFieldKind::U32 => 4,
            KeyFieldKind::U64 | KeyFieldKind::Name => 8,
            KeyFieldKind::U128 => 16,
            KeyFieldKind::Checksum256 => 32,
        }
    }
}

/// A decoded key field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValue {
    U32(u32),
    U64(u64),
    U128(u128),
    Name(Name),
    Checksum256(Checksum256),
}

impl KeyValue {
    pub fn kind(&self) -> KeyFieldKind {
        match self {
            KeyValue::U32(_) => KeyFieldKind::U32,
            KeyValue::U64(_) => KeyFieldKind::U64,
            KeyValue::U128(_) => KeyFieldKind::U128,
            KeyValue::Name(_) => KeyFieldKind::Name,
            KeyValue::Checksum256(_) => KeyFieldKind::Checksum256,
        }
    }

    fn push_key_bytes(&self, out: &mut Vec<u8>) {
        match self {
            KeyValue::U32(v) => v.push_key_bytes(out),
            KeyValue::U64(v) => v.push_key_bytes(out),
            KeyValue::U128(v) => v.push_key_bytes(out),
            KeyValue::Name(v) => v.push_key_bytes(out),
            KeyValue::Checksum256(v) => v.push_key_bytes(out),
        }
    }

    fn increment(&mut self) -> bool {
        match self {
            KeyValue::U32(v) => v.increment(),
            KeyValue::U64(v) => v.increment(),
            KeyValue::U128(v) => v.increment(),
            KeyValue::Name(v) => v.increment(),
            KeyValue::Checksum256(v) => v.increment(),
        }
    }

    /// Read one field in the chain's wire form (little-endian scalars, raw
    /// digest bytes).
    fn decode_wire(kind: KeyFieldKind, buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        Ok(match kind {
            KeyFieldKind::U32 => {
                let (v, rest) = u32::decode_unfinished(buf)?;
                (KeyValue::U32(v), rest)
            }
            KeyFieldKind::U64 => {
                let (v, rest) = u64::decode_unfinished(buf)?;
                (KeyValue::U64(v), rest)
            }
            KeyFieldKind::U128 => {
                let (v, rest) = u128::decode_unfinished(buf)?;
                (KeyValue::U128(v), rest)
            }
            KeyFieldKind::Name => {
                let (v, rest) = Name::decode_unfinished(buf)?;
                (KeyValue::Name(v), rest)
            }
            KeyFieldKind::Checksum256 => {
                let (v, rest) = Checksum256::decode_unfinished(buf)?;
                (KeyValue::Checksum256(v), rest)
            }
        })
    }

    /// Read one field from its canonical big-endian storage form.
    fn from_storage_bytes(kind: KeyFieldKind, bytes: &[u8]) -> Result<Self, WireDecodeError> {
        let fixed = |n: usize| -> Result<&[u8], WireDecodeError> {
            bytes.get(..n).ok_or(WireDecodeError::UnexpectedEof)
        };
        Ok(match kind {
            KeyFieldKind::U32 => KeyValue::U32(u32::from_be_bytes(
                fixed(4)?.try_into().map_err(|_| WireDecodeError::UnexpectedEof)?,
            )),
            KeyFieldKind::U64 => KeyValue::U64(u64::from_be_bytes(
                fixed(8)?.try_into().map_err(|_| WireDecodeError::UnexpectedEof)?,
            )),
            KeyFieldKind::U128 => KeyValue::U128(u128::from_be_bytes(
                fixed(16)?.try_into().map_err(|_| WireDecodeError::UnexpectedEof)?,
            )),
            KeyFieldKind::Name => KeyValue::Name(Name(u64::from_be_bytes(
                fixed(8)?.try_into().map_err(|_| WireDecodeError::UnexpectedEof)?,
            ))),
            KeyFieldKind::Checksum256 => KeyValue::Checksum256(Checksum256(
                fixed(32)?.try_into().map_err(|_| WireDecodeError::UnexpectedEof)?,
            )),
        })
    }
}

/// An ordered tuple of key fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeKey {
    pub fields: Vec<KeyValue>,
}

impl CompositeKey {
    pub fn new(fields: Vec<KeyValue>) -> Self {
        CompositeKey { fields }
    }

    /// Decode the key fields in schema order from the chain's wire form.
    pub fn decode_wire<'a>(
        schema: &[KeyFieldKind],
        buf: &'a [u8],
    ) -> Result<(Self, &'a [u8]), WireDecodeError> {
        let mut fields = Vec::with_capacity(schema.len());
        let mut rest = buf;
        for &kind in schema {
            let (value, tail) = KeyValue::decode_wire(kind, rest)?;
            fields.push(value);
            rest = tail;
        }
        Ok((CompositeKey { fields }, rest))
    }

    /// Append the key fields in the chain's wire form (the form requests
    /// carry them in).
    pub fn encode_wire(&self, buf: &mut dyn bytes::BufMut) {
        for field in &self.fields {
            match field {
                KeyValue::U32(v) => v.encode(buf),
                KeyValue::U64(v) => v.encode(buf),
                KeyValue::U128(v) => v.encode(buf),
                KeyValue::Name(v) => v.encode(buf),
                KeyValue::Checksum256(v) => v.encode(buf),
            }
        }
    }

    /// Decode the key fields from their canonical big-endian storage form.
    pub fn from_storage_bytes(
        schema: &[KeyFieldKind],
        bytes: &[u8],
    ) -> Result<Self, WireDecodeError> {
        let mut fields = Vec::with_capacity(schema.len());
        let mut rest = bytes;
        for &kind in schema {
            let value = KeyValue::from_storage_bytes(kind, rest)?;
            rest = &rest[kind.key_len()..];
            fields.push(value);
        }
        Ok(CompositeKey { fields })
    }

    /// The concatenated canonical big-endian encoding. Byte order on these
    /// encodings is the key order.
    pub fn storage_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        for field in &self.fields {
            field.push_key_bytes(&mut out);
        }
        out
    }

    pub fn encoded_len(&self) -> usize {
        self.fields.iter().map(|f| f.kind().key_len()).sum()
    }

    /// Advance to the successor key: increment the last field and carry
    /// right-to-left on wrap. Returns true when the whole key wrapped (the
    /// successor of the maximum is undefined; callers treat it as an empty
    /// range).
    pub fn increment(&mut self) -> bool {
        for field in self.fields.iter_mut().rev() {
            if !field.increment() {
                return false;
            }
        }
        true
    }
}
