use core::{convert::TryFrom, time::Duration};
use std::time::SystemTime;

use crate::{
    error::{Error, Result},
    keys::{Ed25519PublicKey, Ed25519SecretKey},
};

use ed25519_dalek::{Signature, Signer};

/// Length of an encoded `SignatureNoiseMessage` carrying an Ed25519 signature.
pub const SIGNATURE_MESSAGE_LEN: usize = SignedPartHeader::SIZE + 2 + Signature::BYTE_SIZE;

/// Header of the `SignedPart` that will also be part of the `Certificate`
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SignedPartHeader {
    version: u16,
    // Validity start time (unix timestamp)
    valid_from: u32,
    // Signature is invalid after this point in time (unix timestamp)
    not_valid_after: u32,
}

impl SignedPartHeader {
    const VERSION: u16 = 0;
    const SIZE: usize = 10;

    pub fn new(valid_from: u32, not_valid_after: u32) -> Self {
        Self {
            version: Self::VERSION,
            valid_from,
            not_valid_after,
        }
    }

    pub fn serialize_to(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.version.to_le_bytes());
        dst.extend_from_slice(&self.valid_from.to_le_bytes());
        dst.extend_from_slice(&self.not_valid_after.to_le_bytes());
    }

    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        if b.len() < Self::SIZE {
            return Err(Error::InvalidMessageLength(b.len()));
        }
        let version = u16::from_le_bytes([b[0], b[1]]);
        let valid_from = u32::from_le_bytes([b[2], b[3], b[4], b[5]]);
        let not_valid_after = u32::from_le_bytes([b[6], b[7], b[8], b[9]]);
        Ok(Self {
            version,
            valid_from,
            not_valid_after,
        })
    }

    pub fn with_duration(valid_for: Duration) -> Result<Self> {
        let valid_from = SystemTime::now();
        let not_valid_after = valid_from + valid_for;
        Ok(Self::new(
            system_time_to_unix_time_u32(&valid_from)?,
            system_time_to_unix_time_u32(&not_valid_after)?,
        ))
    }

    pub fn valid_from(&self) -> Result<SystemTime> {
        unix_time_u32_to_system_time(self.valid_from)
    }

    pub fn not_valid_after(&self) -> Result<SystemTime> {
        unix_time_u32_to_system_time(self.not_valid_after)
    }

    /// A certificate is usable in `[valid_from, not_valid_after)`.
    pub fn verify_expiration(&self, now: SystemTime) -> Result<()> {
        let now_timestamp = system_time_to_unix_time_u32(&now)?;
        if now_timestamp < self.valid_from {
            return Err(Error::CertificateInvalid(self.valid_from, now_timestamp));
        }
        if now_timestamp >= self.not_valid_after {
            return Err(Error::CertificateExpired(
                self.not_valid_after,
                now_timestamp,
            ));
        }
        Ok(())
    }
}

/// Convert system time to UNIX time
fn system_time_to_unix_time_u32(t: &SystemTime) -> Result<u32> {
    Ok(t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|duration| duration.as_secs() as u32)?)
}

/// Convert UNIX time to system time
fn unix_time_u32_to_system_time(unix_timestamp: u32) -> Result<SystemTime> {
    SystemTime::UNIX_EPOCH
        .checked_add(Duration::from_secs(unix_timestamp.into()))
        .ok_or(Error::BadTimestampFromSystemTime(unix_timestamp))
}

/// Helper struct for performing the actual signature of the relevant parts of the certificate
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SignedPart {
    pub(crate) header: SignedPartHeader,
    pub(crate) pubkey: Vec<u8>,
    pub(crate) authority_public_key: Ed25519PublicKey,
}

impl SignedPart {
    pub fn new(
        header: SignedPartHeader,
        pubkey: Vec<u8>,
        authority_public_key: Ed25519PublicKey,
    ) -> Self {
        Self {
            header,
            pubkey,
            authority_public_key,
        }
    }

    /// version | valid_from | not_valid_after | len | static key | len | authority key
    fn serialize_to_buf(&self) -> Vec<u8> {
        let auth_pub_k = self.authority_public_key.as_bytes();
        let mut buf = Vec::with_capacity(SignedPartHeader::SIZE + 4 + self.pubkey.len() + 32);
        self.header.serialize_to(&mut buf);
        buf.extend_from_slice(&(self.pubkey.len() as u16).to_le_bytes());
        buf.extend_from_slice(&self.pubkey);
        buf.extend_from_slice(&(auth_pub_k.len() as u16).to_le_bytes());
        buf.extend_from_slice(auth_pub_k);
        buf
    }

    /// Generates the actual `ed25519_dalek::Signature` to embed into the certificate.
    pub fn sign_with(&self, authority: &Ed25519SecretKey) -> Signature {
        debug_assert_eq!(
            authority.public_key(),
            self.authority_public_key,
            "BUG: Signing Authority public key ({}) inside the certificate doesn't match the key \
             we are trying to sign with (its public key is: {})",
            self.authority_public_key,
            authority.public_key(),
        );
        authority.0.sign(&self.serialize_to_buf())
    }

    /// Verifies the specified `signature` against this signed part.
    pub(crate) fn verify(&self, signature: &Signature) -> Result<()> {
        self.authority_public_key
            .0
            .verify_strict(&self.serialize_to_buf(), signature)?;
        Ok(())
    }

    pub(crate) fn verify_expiration(&self, now: SystemTime) -> Result<()> {
        self.header.verify_expiration(now)
    }
}

/// The payload message that will be appended to the handshake message to proof static key
/// authenticity
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SignatureNoiseMessage {
    pub(crate) header: SignedPartHeader,
    pub(crate) signature: Signature,
}

impl SignatureNoiseMessage {
    /// Signs `static_public_key` with the authority key, the certificate is valid for
    /// `duration` starting now.
    pub fn sign(
        static_public_key: &[u8],
        authority: &Ed25519SecretKey,
        duration: Duration,
    ) -> Result<Self> {
        let header = SignedPartHeader::with_duration(duration)?;
        let signed_part = SignedPart::new(
            header.clone(),
            static_public_key.to_vec(),
            authority.public_key(),
        );
        let signature = signed_part.sign_with(authority);
        Ok(Self { header, signature })
    }

    /// version | valid_from | not_valid_after | signature_length | signature
    pub fn serialize_to_vec(&self) -> Vec<u8> {
        let mut dst = Vec::with_capacity(SIGNATURE_MESSAGE_LEN);
        self.header.serialize_to(&mut dst);
        dst.extend_from_slice(&(Signature::BYTE_SIZE as u16).to_le_bytes());
        dst.extend_from_slice(&self.signature.to_bytes());
        dst
    }

    /// Checks that `remote_static_key` was signed by `authority` and that the certificate is
    /// valid at `now`.
    pub fn verify(
        &self,
        remote_static_key: &[u8],
        authority: &Ed25519PublicKey,
        now: SystemTime,
    ) -> Result<()> {
        let signed_part = SignedPart::new(
            self.header.clone(),
            remote_static_key.to_vec(),
            *authority,
        );
        signed_part.verify(&self.signature)?;
        signed_part.verify_expiration(now)
    }
}

// Deserialization implementation
impl TryFrom<&[u8]> for SignatureNoiseMessage {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self> {
        if data.len() != SIGNATURE_MESSAGE_LEN {
            return Err(Error::InvalidMessageLength(data.len()));
        }
        let header = SignedPartHeader::from_bytes(&data[0..SignedPartHeader::SIZE])?;
        let sig_len = u16::from_le_bytes([data[10], data[11]]) as usize;
        if sig_len != Signature::BYTE_SIZE {
            return Err(Error::InvalidMessageLength(sig_len));
        }
        let mut signature = [0_u8; Signature::BYTE_SIZE];
        signature.copy_from_slice(&data[12..]);
        Ok(SignatureNoiseMessage {
            header,
            signature: Signature::from_bytes(&signature),
        })
    }
}
