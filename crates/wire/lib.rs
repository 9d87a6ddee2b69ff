//! Binary wire codec for the chain family's native serialization.
//!
//! Fixed-width integers are little-endian, `bool` is a single byte,
//! `varuint32` is LEB128 (7 data bits per byte, MSB continuation, at most
//! five bytes), and byte vectors and strings are `varuint32`-length-prefixed.
//! Structs serialize as their fields concatenated in declared order; the
//! struct impls live next to the type definitions in `quarry-common`.

pub mod decode;
pub mod encode;
pub mod error;

pub use decode::{WireDecode, decode_varuint32};
pub use encode::{WireEncode, encode_varuint32};
pub use error::WireDecodeError;
