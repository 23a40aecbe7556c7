// Encoding and decoding traits shared by every Sv2 data type.
//
// Encoding appends to a `Vec<u8>`, decoding consumes from the front of a `&[u8]` cursor, so a
// struct is decoded by decoding each field in declaration order from the same cursor.
use crate::Error;

/// Types that know how many bytes their encoding occupies.
pub trait GetSize {
    fn get_size(&self) -> usize;
}

/// Types whose encoding always has the same length.
pub trait Fixed {
    const SIZE: usize;
}

impl<T: Fixed> GetSize for T {
    fn get_size(&self) -> usize {
        T::SIZE
    }
}

/// Serializes a value into its Sv2 representation.
pub trait Encodable: GetSize {
    /// Appends the encoding of `self` to `dst`.
    fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), Error>;
}

/// Deserializes a value from its Sv2 representation.
pub trait Decodable: Sized {
    /// Decodes a value from the front of `data` and advances `data` past the consumed bytes.
    fn decode_from(data: &mut &[u8]) -> Result<Self, Error>;
}

/// Splits `len` bytes off the front of the cursor.
pub(crate) fn take<'a>(data: &mut &'a [u8], len: usize) -> Result<&'a [u8], Error> {
    if data.len() < len {
        return Err(Error::ReadError(len, data.len()));
    }
    let (head, tail) = data.split_at(len);
    *data = tail;
    Ok(head)
}

/// Reads a little endian length prefix of `header_size` bytes (1, 2 or 3).
pub(crate) fn read_len(data: &mut &[u8], header_size: usize) -> Result<usize, Error> {
    let bytes = take(data, header_size)?;
    let mut le = [0_u8; 4];
    le[..header_size].copy_from_slice(bytes);
    Ok(u32::from_le_bytes(le) as usize)
}

pub(crate) fn write_len(dst: &mut Vec<u8>, len: usize, header_size: usize) {
    dst.extend_from_slice(&(len as u32).to_le_bytes()[..header_size]);
}
