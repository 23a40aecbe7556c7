use std::{
    convert::From,
    fmt::Debug,
    sync::{MutexGuard, PoisonError},
};

use channels_sv2::ChannelError;
use handlers_sv2::HandlerErrorType;
use parsers_sv2::ParserError;

pub type PoolResult<T> = Result<T, PoolError>;

/// Represents various errors that can occur in the pool implementation.
#[derive(std::fmt::Debug)]
pub enum PoolError {
    /// I/O-related error.
    Io(std::io::Error),
    /// Error when sending a message through a channel.
    ChannelSend(Box<dyn std::marker::Send + Debug>),
    /// Error when receiving a message from an asynchronous channel.
    ChannelRecv(async_channel::RecvError),
    /// Error from the `binary_sv2` crate.
    BinarySv2(binary_sv2::Error),
    /// Error from the `noise_sv2` crate.
    Noise(noise_sv2::Error),
    /// Parser Error
    Parser(ParserError),
    /// Error of a downstream connection
    Network(network_helpers_sv2::Error),
    /// Error from the channel, session or job registries
    Channel(ChannelError),
    /// Error due to a poisoned lock, typically from a failed mutex operation.
    PoisonLock(String),
    /// Error indicating that a component has shut down unexpectedly.
    ComponentShutdown(String),
    /// Custom error message.
    Custom(String),
    /// A message this role does not handle
    UnexpectedMessage(u8),
    /// A well formed message that is invalid on this connection
    ProtocolViolation(String),
    /// The configured authority public key is not the one of the authority secret key
    KeypairMismatch,
}

impl PoolError {
    /// Errors after which the downstream connection can not go on.
    pub fn is_fatal(&self) -> bool {
        match self {
            PoolError::Network(e) => e.is_fatal(),
            PoolError::ChannelSend(_)
            | PoolError::Channel(_)
            | PoolError::Noise(_)
            | PoolError::UnexpectedMessage(_)
            | PoolError::ProtocolViolation(_) => false,
            _ => true,
        }
    }
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use PoolError::*;
        match self {
            Io(e) => write!(f, "I/O error: `{e:?}"),
            ChannelSend(e) => write!(f, "Channel send failed: `{e:?}`"),
            ChannelRecv(e) => write!(f, "Channel recv failed: `{e:?}`"),
            BinarySv2(e) => write!(f, "Binary SV2 error: `{e:?}`"),
            Noise(e) => write!(f, "Noise SV2 error: `{e:?}"),
            Parser(e) => write!(f, "Parser error: `{e:?}`"),
            Network(e) => write!(f, "Connection error: {e}"),
            Channel(e) => write!(f, "Channel error: {e}"),
            PoisonLock(e) => write!(f, "Poison lock: {e:?}"),
            ComponentShutdown(e) => write!(f, "Component shutdown: {e:?}"),
            Custom(e) => write!(f, "Custom SV2 error: `{e:?}`"),
            UnexpectedMessage(message_type) => {
                write!(f, "Unexpected message type: 0x{message_type:02x}")
            }
            ProtocolViolation(e) => write!(f, "Protocol violation: {e}"),
            KeypairMismatch => write!(
                f,
                "Authority public key does not match the authority secret key"
            ),
        }
    }
}

impl std::error::Error for PoolError {}

impl From<std::io::Error> for PoolError {
    fn from(e: std::io::Error) -> PoolError {
        PoolError::Io(e)
    }
}

impl From<async_channel::RecvError> for PoolError {
    fn from(e: async_channel::RecvError) -> PoolError {
        PoolError::ChannelRecv(e)
    }
}

impl From<binary_sv2::Error> for PoolError {
    fn from(e: binary_sv2::Error) -> PoolError {
        PoolError::BinarySv2(e)
    }
}

impl From<noise_sv2::Error> for PoolError {
    fn from(e: noise_sv2::Error) -> PoolError {
        PoolError::Noise(e)
    }
}

impl<T: 'static + std::marker::Send + Debug> From<async_channel::SendError<T>> for PoolError {
    fn from(e: async_channel::SendError<T>) -> PoolError {
        PoolError::ChannelSend(Box::new(e))
    }
}

impl<T: 'static + std::marker::Send + Debug> From<async_channel::TrySendError<T>> for PoolError {
    fn from(e: async_channel::TrySendError<T>) -> PoolError {
        PoolError::ChannelSend(Box::new(e))
    }
}

impl From<String> for PoolError {
    fn from(e: String) -> PoolError {
        PoolError::Custom(e)
    }
}

impl From<ParserError> for PoolError {
    fn from(value: ParserError) -> Self {
        PoolError::Parser(value)
    }
}

impl From<network_helpers_sv2::Error> for PoolError {
    fn from(value: network_helpers_sv2::Error) -> Self {
        PoolError::Network(value)
    }
}

impl From<ChannelError> for PoolError {
    fn from(value: ChannelError) -> Self {
        PoolError::Channel(value)
    }
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for PoolError {
    fn from(e: PoisonError<MutexGuard<T>>) -> PoolError {
        PoolError::PoisonLock(e.to_string())
    }
}

impl HandlerErrorType for PoolError {
    fn parse_error(error: ParserError) -> Self {
        PoolError::Parser(error)
    }

    fn unexpected_message(message_type: u8) -> Self {
        PoolError::UnexpectedMessage(message_type)
    }
}
