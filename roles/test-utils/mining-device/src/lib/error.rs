use channels_sv2::ChannelError;
use handlers_sv2::HandlerErrorType;
use parsers_sv2::ParserError;
use std::{
    fmt,
    sync::{MutexGuard, PoisonError},
};

pub type DeviceResult<T> = Result<T, DeviceError>;

#[derive(Debug)]
pub enum DeviceError {
    Io(std::io::Error),
    /// The pool address did not resolve to any socket address
    InvalidAddress(String),
    BinarySv2(binary_sv2::Error),
    Noise(noise_sv2::Error),
    Parser(ParserError),
    /// Error of the upstream connection
    Network(network_helpers_sv2::Error),
    Channel(ChannelError),
    PoisonLock(String),
    UnexpectedMessage(u8),
    /// A well formed message that is invalid in the current state of the device
    ProtocolViolation(String),
    /// The pool answered the setup with an error code
    SetupRefused(String),
    /// The pool asked the device to move to another endpoint
    ReconnectRequested(String, u16),
}

impl DeviceError {
    /// Errors after which the connection to the pool is dropped.
    pub fn is_fatal(&self) -> bool {
        match self {
            DeviceError::Network(e) => e.is_fatal(),
            DeviceError::Channel(_)
            | DeviceError::UnexpectedMessage(_)
            | DeviceError::ProtocolViolation(_) => false,
            _ => true,
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DeviceError::*;
        match self {
            Io(e) => write!(f, "I/O error: `{e:?}`"),
            InvalidAddress(a) => write!(f, "Invalid pool address `{a}`, expected host:port"),
            BinarySv2(e) => write!(f, "Binary SV2 error: `{e:?}`"),
            Noise(e) => write!(f, "Noise SV2 error: `{e:?}`"),
            Parser(e) => write!(f, "Parser error: `{e:?}`"),
            Network(e) => write!(f, "Connection error: {e}"),
            Channel(e) => write!(f, "Channel error: {e}"),
            PoisonLock(e) => write!(f, "Poison lock: {e:?}"),
            UnexpectedMessage(message_type) => {
                write!(f, "Unexpected message type: 0x{message_type:02x}")
            }
            ProtocolViolation(e) => write!(f, "Protocol violation: {e}"),
            SetupRefused(code) => write!(f, "Connection setup refused: {code}"),
            ReconnectRequested(host, port) => {
                write!(f, "Pool requested a reconnection to {host}:{port}")
            }
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<std::io::Error> for DeviceError {
    fn from(e: std::io::Error) -> Self {
        DeviceError::Io(e)
    }
}

impl From<binary_sv2::Error> for DeviceError {
    fn from(e: binary_sv2::Error) -> Self {
        DeviceError::BinarySv2(e)
    }
}

impl From<noise_sv2::Error> for DeviceError {
    fn from(e: noise_sv2::Error) -> Self {
        DeviceError::Noise(e)
    }
}

impl From<ParserError> for DeviceError {
    fn from(e: ParserError) -> Self {
        DeviceError::Parser(e)
    }
}

impl From<network_helpers_sv2::Error> for DeviceError {
    fn from(e: network_helpers_sv2::Error) -> Self {
        DeviceError::Network(e)
    }
}

impl From<ChannelError> for DeviceError {
    fn from(e: ChannelError) -> Self {
        DeviceError::Channel(e)
    }
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for DeviceError {
    fn from(e: PoisonError<MutexGuard<'_, T>>) -> Self {
        DeviceError::PoisonLock(e.to_string())
    }
}

impl HandlerErrorType for DeviceError {
    fn parse_error(error: ParserError) -> Self {
        DeviceError::Parser(error)
    }

    fn unexpected_message(message_type: u8) -> Self {
        DeviceError::UnexpectedMessage(message_type)
    }
}
