use crate::{header::Header, Error};
use binary_sv2::Encodable;

/// A header plus the still encoded payload of one Sv2 message.
///
/// Frames are what travel inside transport datagrams. Turning the payload into a typed message
/// is the job of the message catalog, which knows what `msg_type` means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sv2Frame {
    header: Header,
    payload: Vec<u8>,
}

impl Sv2Frame {
    /// Encodes `message` and wraps it in a frame.
    pub fn from_message<T: Encodable>(
        message: &T,
        msg_type: u8,
        extension_type: u16,
        channel_msg: bool,
    ) -> Result<Self, Error> {
        let payload = binary_sv2::to_bytes(message)?;
        let header = Header::from_len(payload.len(), msg_type, extension_type, channel_msg)
            .ok_or(Error::PayloadTooBig(payload.len()))?;
        Ok(Self { header, payload })
    }

    /// Parses a complete serialized frame. The payload length declared in the header must match
    /// the number of bytes that follow it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let header = Header::from_bytes(bytes)?;
        let payload = &bytes[Header::SIZE..];
        if payload.len() != header.len() {
            return Err(Error::PayloadLengthMismatch(header.len(), payload.len()));
        }
        Ok(Self {
            header,
            payload: payload.to_vec(),
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut dst = Vec::with_capacity(self.encoded_length());
        dst.extend_from_slice(&self.header.to_bytes());
        dst.extend_from_slice(&self.payload);
        dst
    }

    pub fn encoded_length(&self) -> usize {
        Header::SIZE + self.payload.len()
    }

    pub fn header(&self) -> Header {
        self.header
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frame_from_message() {
        let frame = Sv2Frame::from_message(&0xaabb_u16, 0x21, 0, true).unwrap();
        assert_eq!(frame.serialize(), vec![0x00, 0x80, 0x21, 2, 0, 0, 0xbb, 0xaa]);
        assert_eq!(Sv2Frame::from_bytes(&frame.serialize()).unwrap(), frame);
    }

    #[test]
    fn frame_with_wrong_length() {
        let bytes = [0x00, 0x00, 0x01, 4, 0, 0, 1, 2];
        assert_eq!(
            Sv2Frame::from_bytes(&bytes),
            Err(Error::PayloadLengthMismatch(4, 2))
        );
        assert!(Sv2Frame::from_bytes(&bytes[..4]).is_err());
    }
}
