use crate::Error;
use binary_sv2::U24;
use core::convert::TryInto;

/// Most significant bit of `extension_type`, set for channel scoped messages.
pub const CHANNEL_BIT_MASK: u16 = 0x8000;

/// Common header of every Sv2 message:
///
/// ```txt
/// extension_type  u16  (bit 15 is the channel bit)
/// msg_type        u8
/// msg_length      U24
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Header {
    extension_type: u16,
    msg_type: u8,
    msg_length: U24,
}

impl Header {
    pub const SIZE: usize = const_sv2::SV2_FRAME_HEADER_SIZE;

    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < Self::SIZE {
            return Err(Error::UnexpectedHeaderLength(Self::SIZE - bytes.len()));
        };

        let extension_type = u16::from_le_bytes([bytes[0], bytes[1]]);
        let msg_type = bytes[2];
        let msg_length = u32::from_le_bytes([bytes[3], bytes[4], bytes[5], 0]);

        Ok(Self {
            extension_type,
            msg_type,
            msg_length: msg_length.try_into()?,
        })
    }

    /// Builds a header for a payload of `len` bytes. Returns `None` if `len` does not fit in a
    /// U24.
    #[inline]
    pub fn from_len(len: usize, msg_type: u8, extension_type: u16, channel_msg: bool) -> Option<Self> {
        let extension_type = if channel_msg {
            extension_type | CHANNEL_BIT_MASK
        } else {
            extension_type & !CHANNEL_BIT_MASK
        };
        Some(Self {
            extension_type,
            msg_type,
            msg_length: len.try_into().ok()?,
        })
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let ext = self.extension_type.to_le_bytes();
        let len = u32::from(self.msg_length).to_le_bytes();
        [ext[0], ext[1], self.msg_type, len[0], len[1], len[2]]
    }

    #[allow(clippy::len_without_is_empty)]
    #[inline]
    pub fn len(&self) -> usize {
        self.msg_length.into()
    }

    pub fn msg_type(&self) -> u8 {
        self.msg_type
    }

    /// Extension type without the channel bit.
    pub fn ext_type(&self) -> u16 {
        self.extension_type & !CHANNEL_BIT_MASK
    }

    pub fn channel_msg(&self) -> bool {
        self.extension_type & CHANNEL_BIT_MASK == CHANNEL_BIT_MASK
    }
}
