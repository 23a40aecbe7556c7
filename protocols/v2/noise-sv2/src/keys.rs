//! Ed25519 authority keys as they appear in configuration files: base58 with a checksum.
use crate::Error;
use core::convert::TryFrom;
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

fn decode_32(value: &str) -> Result<[u8; 32], Error> {
    let decoded = bs58::decode(value).with_check(None).into_vec()?;
    decoded
        .as_slice()
        .try_into()
        .map_err(|_| Error::KeyLength(decoded.len()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Ed25519SecretKey(pub SigningKey);

impl Ed25519SecretKey {
    pub fn generate() -> Self {
        Self(SigningKey::generate(&mut rand::rngs::OsRng))
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.0.verifying_key())
    }
}

impl TryFrom<String> for Ed25519SecretKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Ed25519SecretKey {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self(SigningKey::from_bytes(&decode_32(value)?)))
    }
}

impl From<Ed25519SecretKey> for String {
    fn from(secret: Ed25519SecretKey) -> Self {
        secret.to_string()
    }
}

impl Display for Ed25519SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&bs58::encode(self.0.to_bytes()).with_check().into_string())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Ed25519PublicKey(pub VerifyingKey);

impl Ed25519PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl TryFrom<String> for Ed25519PublicKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Ed25519PublicKey {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self(VerifyingKey::from_bytes(&decode_32(value)?)?))
    }
}

impl From<Ed25519PublicKey> for String {
    fn from(public: Ed25519PublicKey) -> Self {
        public.to_string()
    }
}

impl Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&bs58::encode(self.0.as_bytes()).with_check().into_string())
    }
}

impl From<&Ed25519SecretKey> for Ed25519PublicKey {
    fn from(value: &Ed25519SecretKey) -> Self {
        value.public_key()
    }
}
