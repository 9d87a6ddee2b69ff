use crate::error::WireDecodeError;

/// Decode a value from the chain's native binary form.
///
/// `decode_unfinished` returns the decoded value together with the remaining
/// bytes so callers can decode consecutive fields; `decode` additionally
/// rejects trailing bytes.
pub trait WireDecode: Sized {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError>;

    fn decode(buf: &[u8]) -> Result<Self, WireDecodeError> {
        let (value, rest) = Self::decode_unfinished(buf)?;
        if !rest.is_empty() {
            return Err(WireDecodeError::TrailingBytes);
        }
        Ok(value)
    }
}

fn take(buf: &[u8], n: usize) -> Result<(&[u8], &[u8]), WireDecodeError> {
    if buf.len() < n {
        return Err(WireDecodeError::UnexpectedEof);
    }
    Ok(buf.split_at(n))
}

/// LEB128 decoding. Rejects encodings longer than five bytes and values that
/// do not fit in 32 bits.
pub fn decode_varuint32(buf: &[u8]) -> Result<(u32, &[u8]), WireDecodeError> {
    let mut value: u32 = 0;
    let mut shift = 0;
    let mut rest = buf;
    loop {
        let (&byte, tail) = rest.split_first().ok_or(WireDecodeError::UnexpectedEof)?;
        rest = tail;
        if shift == 28 && byte > 0x0f {
            return Err(WireDecodeError::VarUintOverflow);
        }
        value |= u32::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, rest));
        }
        shift += 7;
        if shift > 28 {
            return Err(WireDecodeError::VarUintOverflow);
        }
    }
}

impl WireDecode for bool {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (byte, rest) = u8::decode_unfinished(buf)?;
        match byte {
            0 => Ok((false, rest)),
            1 => Ok((true, rest)),
            other => Err(WireDecodeError::InvalidBool(other)),
        }
    }
}

impl WireDecode for u8 {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (&byte, rest) = buf.split_first().ok_or(WireDecodeError::UnexpectedEof)?;
        Ok((byte, rest))
    }
}

macro_rules! impl_le_decode {
    ($($t:ty),*) => {
        $(impl WireDecode for $t {
            fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
                let (bytes, rest) = take(buf, std::mem::size_of::<$t>())?;
                let value = <$t>::from_le_bytes(
                    bytes.try_into().map_err(|_| WireDecodeError::UnexpectedEof)?,
                );
                Ok((value, rest))
            }
        })*
    };
}

impl_le_decode!(u16, u32, u64, u128, i64);

impl<const N: usize> WireDecode for [u8; N] {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (bytes, rest) = take(buf, N)?;
        let array = bytes.try_into().map_err(|_| WireDecodeError::UnexpectedEof)?;
        Ok((array, rest))
    }
}

impl WireDecode for Vec<u8> {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (len, rest) = decode_varuint32(buf)?;
        let (bytes, rest) = take(rest, len as usize)?;
        Ok((bytes.to_vec(), rest))
    }
}

impl WireDecode for bytes::Bytes {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (bytes, rest) = Vec::<u8>::decode_unfinished(buf)?;
        Ok((bytes.into(), rest))
    }
}

impl WireDecode for String {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), WireDecodeError> {
        let (bytes, rest) = Vec::<u8>::decode_unfinished(buf)?;
        let text = String::from_utf8(bytes).map_err(|_| WireDecodeError::InvalidUtf8)?;
        Ok((text, rest))
    }
}
