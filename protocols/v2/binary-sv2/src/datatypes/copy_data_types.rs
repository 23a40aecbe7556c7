// Fixed size data types: bool, little endian integers, f32, U24 and U256.
use crate::{
    codec::{take, Decodable, Encodable, Fixed},
    Error,
};
use core::convert::{TryFrom, TryInto};

impl Fixed for bool {
    const SIZE: usize = 1;
}

impl Encodable for bool {
    fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), Error> {
        dst.push(*self as u8);
        Ok(())
    }
}

impl Decodable for bool {
    fn decode_from(data: &mut &[u8]) -> Result<Self, Error> {
        match take(data, 1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::NotABool(other)),
        }
    }
}

macro_rules! impl_sv2_for_le_number {
    ($($t:ty),*) => {
        $(
            impl Fixed for $t {
                const SIZE: usize = core::mem::size_of::<$t>();
            }

            impl Encodable for $t {
                fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), Error> {
                    dst.extend_from_slice(&self.to_le_bytes());
                    Ok(())
                }
            }

            impl Decodable for $t {
                fn decode_from(data: &mut &[u8]) -> Result<Self, Error> {
                    let bytes = take(data, <$t as Fixed>::SIZE)?;
                    // take returned exactly SIZE bytes
                    let array = bytes.try_into().map_err(|_| Error::OutOfBound)?;
                    Ok(<$t>::from_le_bytes(array))
                }
            }
        )*
    };
}

impl_sv2_for_le_number!(u8, u16, u32, u64, f32);

/// 24 bit unsigned integer, used for frame payload lengths and `B016M` prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct U24(u32);

impl U24 {
    pub const MAX: u32 = 16_777_215;
}

impl Fixed for U24 {
    const SIZE: usize = 3;
}

impl TryFrom<u32> for U24 {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(Error::U24TooBig(value))
        }
    }
}

impl TryFrom<usize> for U24 {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        let value = u32::try_from(value).map_err(|_| Error::U24TooBig(u32::MAX))?;
        value.try_into()
    }
}

impl From<U24> for u32 {
    fn from(v: U24) -> Self {
        v.0
    }
}

impl From<U24> for usize {
    fn from(v: U24) -> Self {
        v.0 as usize
    }
}

impl Encodable for U24 {
    fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), Error> {
        dst.extend_from_slice(&self.0.to_le_bytes()[..3]);
        Ok(())
    }
}

impl Decodable for U24 {
    fn decode_from(data: &mut &[u8]) -> Result<Self, Error> {
        let bytes = take(data, 3)?;
        Ok(Self(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0])))
    }
}

/// 256 bit unsigned integer stored as 32 little endian bytes. Used for targets and hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct U256([u8; 32]);

impl U256 {
    pub fn inner_as_ref(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl Fixed for U256 {
    const SIZE: usize = 32;
}

impl From<[u8; 32]> for U256 {
    fn from(v: [u8; 32]) -> Self {
        Self(v)
    }
}

impl TryFrom<&[u8]> for U256 {
    type Error = Error;

    fn try_from(v: &[u8]) -> Result<Self, Self::Error> {
        let inner: [u8; 32] = v.try_into().map_err(|_| Error::InvalidU256(v.len()))?;
        Ok(Self(inner))
    }
}

impl TryFrom<Vec<u8>> for U256 {
    type Error = Error;

    fn try_from(v: Vec<u8>) -> Result<Self, Self::Error> {
        Self::try_from(&v[..])
    }
}

impl Encodable for U256 {
    fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), Error> {
        dst.extend_from_slice(&self.0);
        Ok(())
    }
}

impl Decodable for U256 {
    fn decode_from(data: &mut &[u8]) -> Result<Self, Error> {
        Self::try_from(take(data, 32)?)
    }
}
