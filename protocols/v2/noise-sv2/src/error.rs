use core::fmt;
use std::time::SystemTimeError;

#[derive(Debug)]
pub enum Error {
    /// The handshake pattern or a transport datagram was rejected by the noise state machine
    Snow(snow::Error),
    /// A handshake message that is too short or too long for the current step
    InvalidMessageLength(usize),
    /// Certificate is not valid yet: valid_from, now
    CertificateInvalid(u32, u32),
    /// Certificate expired: not_valid_after, now
    CertificateExpired(u32, u32),
    InvalidSignature(ed25519_dalek::SignatureError),
    /// The responder did not provide a static key
    MissingRemoteStatic,
    /// Encrypt or decrypt called before the handshake completed
    NotInTransportMode,
    /// A handshake step called on the wrong role or twice
    InvalidState,
    MessageTooBig(usize),
    Bs58Decode(bs58::decode::Error),
    KeyLength(usize),
    SystemTime(SystemTimeError),
    BadTimestampFromSystemTime(u32),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// True when the remote completed the handshake but its certificate can not be trusted.
    pub fn is_untrusted_peer(&self) -> bool {
        matches!(
            self,
            Error::CertificateInvalid(..)
                | Error::CertificateExpired(..)
                | Error::InvalidSignature(_)
                | Error::MissingRemoteStatic
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            Snow(e) => write!(f, "Noise error: `{}`", e),
            InvalidMessageLength(len) => write!(f, "Invalid handshake message length: `{}`", len),
            CertificateInvalid(valid_from, now) => write!(
                f,
                "Certificate not valid before `{}`, now is `{}`",
                valid_from, now
            ),
            CertificateExpired(not_valid_after, now) => write!(
                f,
                "Certificate expired at `{}`, now is `{}`",
                not_valid_after, now
            ),
            InvalidSignature(e) => write!(f, "Invalid certificate signature: `{}`", e),
            MissingRemoteStatic => write!(f, "Remote did not send a static key"),
            NotInTransportMode => write!(f, "Noise codec is not in transport mode"),
            InvalidState => write!(f, "Handshake step not valid in the current state"),
            MessageTooBig(len) => write!(f, "Message of `{}` bytes does not fit a datagram", len),
            Bs58Decode(e) => write!(f, "Base58 code error: `{}`", e),
            KeyLength(len) => write!(f, "Bad key length: `{}`", len),
            SystemTime(e) => write!(f, "System time error: `{}`", e),
            BadTimestampFromSystemTime(t) => write!(f, "Bad unix timestamp: `{}`", t),
        }
    }
}

impl std::error::Error for Error {}

impl From<snow::Error> for Error {
    fn from(e: snow::Error) -> Self {
        Error::Snow(e)
    }
}

impl From<ed25519_dalek::SignatureError> for Error {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        Error::InvalidSignature(e)
    }
}

impl From<bs58::decode::Error> for Error {
    fn from(e: bs58::decode::Error) -> Self {
        Error::Bs58Decode(e)
    }
}

impl From<SystemTimeError> for Error {
    fn from(e: SystemTimeError) -> Self {
        Error::SystemTime(e)
    }
}
