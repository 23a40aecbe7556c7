//! Sv2 binary data format.
//!
//! Every multi byte integer is little endian. Variable size types carry a length prefix whose
//! width depends on the type:
//!
//! ```txt
//! bool     <-> BOOL
//! u8       <-> U8
//! u16      <-> U16
//! U24      <-> U24
//! u32      <-> U32
//! f32      <-> F32
//! u64      <-> U64
//! U256     <-> U256
//! Str0255  <-> STR0_255
//! B032     <-> B0_32
//! B0255    <-> B0_255
//! B064K    <-> B0_64K
//! B016M    <-> B0_16M
//! Seq0255  <-> SEQ0_255[T]
//! Seq064K  <-> SEQ0_64K[T]
//! ```
//!
//! Messages are plain structs whose fields are encoded one after the other, see
//! [`impl_sv2_codec`].
use core::fmt;

mod codec;
mod datatypes;

pub use crate::codec::{Decodable, Encodable, Fixed, GetSize};
pub use datatypes::{Seq0255, Seq064K, Str0255, B016M, B0255, B032, B064K, U24, U256};

/// Encodes `src` into a freshly allocated buffer.
pub fn to_bytes<T: Encodable>(src: &T) -> Result<Vec<u8>, Error> {
    let mut result = Vec::with_capacity(src.get_size());
    src.encode_to(&mut result)?;
    Ok(result)
}

/// Decodes a `T` that must span the whole of `data`.
pub fn from_bytes<T: Decodable>(mut data: &[u8]) -> Result<T, Error> {
    let value = T::decode_from(&mut data)?;
    if !data.is_empty() {
        return Err(Error::TrailingBytes(data.len()));
    }
    Ok(value)
}

/// Converts an integer into a `U256` holding the same value.
pub fn u256_from_int<V: Into<u64>>(value: V) -> U256 {
    let mut inner = [0_u8; 32];
    inner[..8].copy_from_slice(&value.into().to_le_bytes());
    inner.into()
}

/// Implements [`GetSize`], [`Encodable`] and [`Decodable`] for a struct by (de)serializing the
/// listed fields in order. The list must name every field of the struct.
///
/// ```
/// use binary_sv2::{impl_sv2_codec, Str0255};
///
/// #[derive(Debug, PartialEq)]
/// struct Ping {
///     nonce: u32,
///     tag: Str0255,
/// }
/// impl_sv2_codec!(Ping { nonce, tag });
///
/// let ping = Ping { nonce: 7, tag: "hi".try_into().unwrap() };
/// let bytes = binary_sv2::to_bytes(&ping).unwrap();
/// assert_eq!(bytes, vec![7, 0, 0, 0, 2, b'h', b'i']);
/// assert_eq!(binary_sv2::from_bytes::<Ping>(&bytes).unwrap(), ping);
/// ```
#[macro_export]
macro_rules! impl_sv2_codec {
    ($name:ident { $($field:ident),* $(,)? }) => {
        impl $crate::GetSize for $name {
            fn get_size(&self) -> usize {
                0 $(+ $crate::GetSize::get_size(&self.$field))*
            }
        }

        impl $crate::Encodable for $name {
            fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), $crate::Error> {
                $($crate::Encodable::encode_to(&self.$field, dst)?;)*
                Ok(())
            }
        }

        impl $crate::Decodable for $name {
            fn decode_from(data: &mut &[u8]) -> Result<Self, $crate::Error> {
                Ok($name {
                    $($field: $crate::Decodable::decode_from(data)?,)*
                })
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    OutOfBound,
    NotABool(u8),
    /// Expected and actual number of bytes left
    ReadError(usize, usize),
    TrailingBytes(usize),
    U24TooBig(u32),
    InvalidU256(usize),
    InvalidStr0255Size(usize),
    InvalidUtf8,
    InvalidB032Size(usize),
    InvalidB0255Size(usize),
    InvalidB064KSize(usize),
    InvalidB016MSize(usize),
    InvalidSeq0255Size(usize),
    InvalidSeq064KSize(usize),
    ValueIsNotAValidProtocol(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            OutOfBound => write!(f, "Out of bound"),
            NotABool(b) => write!(f, "Byte `{}` is not a bool", b),
            ReadError(expected, actual) => write!(
                f,
                "Needed {} bytes but only {} are left in the buffer",
                expected, actual
            ),
            TrailingBytes(n) => write!(f, "{} bytes left in the buffer after decoding", n),
            U24TooBig(v) => write!(f, "`{}` does not fit in a U24", v),
            InvalidU256(len) => write!(f, "U256 must be 32 bytes, got {}", len),
            InvalidStr0255Size(len) => write!(f, "Str0255 can not be {} bytes long", len),
            InvalidUtf8 => write!(f, "Str0255 is not valid utf-8"),
            InvalidB032Size(len) => write!(f, "B032 can not be {} bytes long", len),
            InvalidB0255Size(len) => write!(f, "B0255 can not be {} bytes long", len),
            InvalidB064KSize(len) => write!(f, "B064K can not be {} bytes long", len),
            InvalidB016MSize(len) => write!(f, "B016M can not be {} bytes long", len),
            InvalidSeq0255Size(len) => write!(f, "Seq0255 can not have {} elements", len),
            InvalidSeq064KSize(len) => write!(f, "Seq064K can not have {} elements", len),
            ValueIsNotAValidProtocol(v) => write!(f, "`{}` is not a valid protocol", v),
        }
    }
}

impl std::error::Error for Error {}
