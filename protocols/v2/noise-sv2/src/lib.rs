//! Sv2 noise: the encrypted transport every Sv2 connection runs on.
//!
//! A connection starts with an NX handshake ([`Initiator`], [`Responder`]) during which the
//! responder proves that its static key is certified by a pool authority. After that every frame
//! travels as a transport datagram: a 2 bytes little endian length followed by the ciphertext
//! produced by [`NoiseCodec`].
mod auth;
mod error;
mod handshake;
pub mod keys;

pub use auth::{SignatureNoiseMessage, SignedPart, SignedPartHeader, SIGNATURE_MESSAGE_LEN};
pub use error::{Error, Result};
pub use handshake::{HandshakeRole, Initiator, Responder, State};

use const_sv2::{NOISE_FRAME_HEADER_SIZE, NOISE_FRAME_MAX_SIZE, NOISE_MAX_PLAINTEXT, SNOW_TAGLEN};

/// Directional cipher contexts of a completed handshake. Associated data is always empty.
pub struct NoiseCodec {
    transport: snow::TransportState,
}

impl std::fmt::Debug for NoiseCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseCodec").finish()
    }
}

impl NoiseCodec {
    fn new(transport: snow::TransportState) -> Self {
        Self { transport }
    }

    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.len() > NOISE_MAX_PLAINTEXT {
            return Err(Error::MessageTooBig(plaintext.len()));
        }
        let mut ciphertext = vec![0_u8; plaintext.len() + SNOW_TAGLEN];
        let len = self.transport.write_message(plaintext, &mut ciphertext)?;
        ciphertext.truncate(len);
        Ok(ciphertext)
    }

    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let mut plaintext = vec![0_u8; ciphertext.len()];
        let len = self.transport.read_message(ciphertext, &mut plaintext)?;
        plaintext.truncate(len);
        Ok(plaintext)
    }
}

/// Prefixes `payload` with its 2 bytes little endian length.
pub fn wrap_datagram(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > NOISE_FRAME_MAX_SIZE {
        return Err(Error::MessageTooBig(payload.len()));
    }
    let mut datagram = Vec::with_capacity(NOISE_FRAME_HEADER_SIZE + payload.len());
    datagram.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    datagram.extend_from_slice(payload);
    Ok(datagram)
}

/// Length of the datagram body announced by a 2 bytes header.
pub fn datagram_len(header: [u8; NOISE_FRAME_HEADER_SIZE]) -> usize {
    u16::from_le_bytes(header) as usize
}

/// Strips the length prefix, the announced length must match the rest of `datagram`.
pub fn unwrap_datagram(datagram: &[u8]) -> Result<&[u8]> {
    if datagram.len() < NOISE_FRAME_HEADER_SIZE {
        return Err(Error::InvalidMessageLength(datagram.len()));
    }
    let len = datagram_len([datagram[0], datagram[1]]);
    let body = &datagram[NOISE_FRAME_HEADER_SIZE..];
    if body.len() != len {
        return Err(Error::InvalidMessageLength(body.len()));
    }
    Ok(body)
}
