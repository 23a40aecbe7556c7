// Variable size data types: length prefixed byte arrays, strings and sequences.
//
// Every type carries its own maximum length. Building one from a longer input fails with the
// matching `Invalid*Size` error rather than truncating.
use crate::{
    codec::{read_len, take, write_len, Decodable, Encodable, GetSize},
    Error,
};
use core::{
    convert::{TryFrom, TryInto},
    fmt,
};

macro_rules! impl_bounded_bytes {
    ($name:ident, $header_size:expr, $max:expr, $err:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
        pub struct $name(Vec<u8>);

        impl $name {
            pub const MAX_LEN: usize = $max;

            pub fn inner_as_ref(&self) -> &[u8] {
                &self.0
            }

            pub fn into_inner(self) -> Vec<u8> {
                self.0
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl TryFrom<Vec<u8>> for $name {
            type Error = Error;

            fn try_from(v: Vec<u8>) -> Result<Self, Self::Error> {
                if v.len() > $max {
                    Err(Error::$err(v.len()))
                } else {
                    Ok(Self(v))
                }
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = Error;

            fn try_from(v: &[u8]) -> Result<Self, Self::Error> {
                v.to_vec().try_into()
            }
        }

        impl From<$name> for Vec<u8> {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl GetSize for $name {
            fn get_size(&self) -> usize {
                $header_size + self.0.len()
            }
        }

        impl Encodable for $name {
            fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), Error> {
                write_len(dst, self.0.len(), $header_size);
                dst.extend_from_slice(&self.0);
                Ok(())
            }
        }

        impl Decodable for $name {
            fn decode_from(data: &mut &[u8]) -> Result<Self, Error> {
                let len = read_len(data, $header_size)?;
                if len > $max {
                    return Err(Error::$err(len));
                }
                Ok(Self(take(data, len)?.to_vec()))
            }
        }
    };
}

impl_bounded_bytes!(B032, 1, 32, InvalidB032Size);
impl_bounded_bytes!(B0255, 1, 255, InvalidB0255Size);
impl_bounded_bytes!(B064K, 2, 65_535, InvalidB064KSize);
impl_bounded_bytes!(B016M, 3, 16_777_215, InvalidB016MSize);

/// UTF-8 string of at most 255 bytes, prefixed by a one byte length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Str0255(String);

impl Str0255 {
    pub const MAX_LEN: usize = 255;

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Str0255 {
    type Error = Error;

    fn try_from(v: String) -> Result<Self, Self::Error> {
        if v.len() > Self::MAX_LEN {
            Err(Error::InvalidStr0255Size(v.len()))
        } else {
            Ok(Self(v))
        }
    }
}

impl TryFrom<&str> for Str0255 {
    type Error = Error;

    fn try_from(v: &str) -> Result<Self, Self::Error> {
        v.to_string().try_into()
    }
}

impl fmt::Display for Str0255 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl GetSize for Str0255 {
    fn get_size(&self) -> usize {
        1 + self.0.len()
    }
}

impl Encodable for Str0255 {
    fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), Error> {
        write_len(dst, self.0.len(), 1);
        dst.extend_from_slice(self.0.as_bytes());
        Ok(())
    }
}

impl Decodable for Str0255 {
    fn decode_from(data: &mut &[u8]) -> Result<Self, Error> {
        let len = read_len(data, 1)?;
        let bytes = take(data, len)?;
        let s = core::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)?;
        Ok(Self(s.to_string()))
    }
}

macro_rules! impl_sequence {
    ($name:ident, $header_size:expr, $max:expr, $err:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name<T>(Vec<T>);

        impl<T> $name<T> {
            pub const MAX_LEN: usize = $max;

            pub fn new(inner: Vec<T>) -> Result<Self, Error> {
                if inner.len() > $max {
                    Err(Error::$err(inner.len()))
                } else {
                    Ok(Self(inner))
                }
            }

            pub fn inner_as_ref(&self) -> &[T] {
                &self.0
            }

            pub fn into_inner(self) -> Vec<T> {
                self.0
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self(Vec::new())
            }
        }

        impl<T> TryFrom<Vec<T>> for $name<T> {
            type Error = Error;

            fn try_from(v: Vec<T>) -> Result<Self, Self::Error> {
                Self::new(v)
            }
        }

        impl<T: GetSize> GetSize for $name<T> {
            fn get_size(&self) -> usize {
                $header_size + self.0.iter().map(GetSize::get_size).sum::<usize>()
            }
        }

        impl<T: Encodable> Encodable for $name<T> {
            fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), Error> {
                write_len(dst, self.0.len(), $header_size);
                for element in &self.0 {
                    element.encode_to(dst)?;
                }
                Ok(())
            }
        }

        impl<T: Decodable> Decodable for $name<T> {
            fn decode_from(data: &mut &[u8]) -> Result<Self, Error> {
                let len = read_len(data, $header_size)?;
                // Every element takes at least one byte, so a count larger than what is left
                // can only be garbage.
                if len > data.len() {
                    return Err(Error::ReadError(len, data.len()));
                }
                let mut inner = Vec::with_capacity(len);
                for _ in 0..len {
                    inner.push(T::decode_from(data)?);
                }
                Ok(Self(inner))
            }
        }
    };
}

impl_sequence!(Seq0255, 1, 255, InvalidSeq0255Size);
impl_sequence!(Seq064K, 2, 65_535, InvalidSeq064KSize);
