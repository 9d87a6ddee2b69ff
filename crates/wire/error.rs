#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireDecodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("trailing bytes after decoded value")]
    TrailingBytes,
    #[error("varuint32 does not fit in 32 bits")]
    VarUintOverflow,
    #[error("invalid boolean byte: {0:#x}")]
    InvalidBool(u8),
    #[error("string is not valid utf-8")]
    InvalidUtf8,
    #[error("{0}")]
    Custom(String),
}
