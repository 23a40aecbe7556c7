//! Networking helpers shared by the Sv2 roles.
//!
//! [`noise_connection::Connection`] runs the noise handshake on a byte stream and then moves
//! frames between the stream and a pair of `async_channel`s. [`processor::ConnectionProcessor`]
//! sits on top of it: it decodes frames into catalog messages, tracks outstanding requests and
//! feeds the messages to the role handlers.
pub mod noise_connection;
pub mod processor;

use async_channel::{RecvError, SendError};
use core::fmt;
use parsers_sv2::ParserError;
use std::sync::atomic::{AtomicU32, Ordering};

pub use processor::{ConnectionProcessor, ConnectionState, RequestRegistry};

static NEXT_CONNECTION_ID: AtomicU32 = AtomicU32::new(0);

/// Process unique connection id, used to tag every log line of a connection.
pub fn next_connection_id() -> u32 {
    NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
pub enum Error {
    /// The noise handshake failed or was cut short
    HandshakeError(noise_sv2::Error),
    /// The peer closed the stream before the handshake completed
    HandshakeInterrupted,
    /// The responder certificate did not verify against the pinned authority key
    UntrustedPeer(noise_sv2::Error),
    /// Encryption or decryption of a transport datagram failed
    TransportError(noise_sv2::Error),
    /// A frame that does not decode into a catalog message
    MalformedMessage(ParserError),
    /// A well formed message that is invalid in the current context
    ProtocolViolation(String),
    // This means that a socket that was supposed to be opened have been closed, likely by the
    // peer
    SocketClosed,
    RecvError,
    SendError,
}

impl Error {
    /// Fatal errors end the connection, the others are reported and the connection goes on.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::ProtocolViolation(_))
    }

    pub(crate) fn from_handshake(e: noise_sv2::Error) -> Self {
        if e.is_untrusted_peer() {
            Error::UntrustedPeer(e)
        } else {
            Error::HandshakeError(e)
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            HandshakeError(e) => write!(f, "Handshake error: `{}`", e),
            HandshakeInterrupted => write!(f, "Connection closed during the handshake"),
            UntrustedPeer(e) => write!(f, "Untrusted peer: `{}`", e),
            TransportError(e) => write!(f, "Transport error: `{}`", e),
            MalformedMessage(e) => write!(f, "Malformed message: `{}`", e),
            ProtocolViolation(e) => write!(f, "Protocol violation: {}", e),
            SocketClosed => write!(f, "Socket closed"),
            RecvError => write!(f, "Channel recv failed"),
            SendError => write!(f, "Channel send failed"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParserError> for Error {
    fn from(e: ParserError) -> Self {
        Error::MalformedMessage(e)
    }
}

impl From<RecvError> for Error {
    fn from(_: RecvError) -> Self {
        Error::RecvError
    }
}

impl<T> From<SendError<T>> for Error {
    fn from(_: SendError<T>) -> Self {
        Error::SendError
    }
}
