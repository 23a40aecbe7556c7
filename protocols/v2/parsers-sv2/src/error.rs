#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// Type tag not in the catalog
    UnexpectedMessage(u8),
    /// Message type and the channel bit it arrived with
    ChannelBitMismatch(u8, bool),
    BadPayloadSize,
    BinaryError(binary_sv2::Error),
    FramingError(framing_sv2::Error),
}

impl From<binary_sv2::Error> for ParserError {
    fn from(e: binary_sv2::Error) -> Self {
        ParserError::BinaryError(e)
    }
}

impl From<framing_sv2::Error> for ParserError {
    fn from(e: framing_sv2::Error) -> Self {
        ParserError::FramingError(e)
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParserError::UnexpectedMessage(msg_type) => {
                write!(f, "Unexpected message type: {msg_type:#04x}")
            }
            ParserError::ChannelBitMismatch(msg_type, bit) => write!(
                f,
                "Message type {msg_type:#04x} received with channel bit {bit}"
            ),
            ParserError::BadPayloadSize => write!(f, "Bad payload size"),
            ParserError::BinaryError(e) => write!(f, "Binary error: {e}"),
            ParserError::FramingError(e) => write!(f, "Framing error: {e}"),
        }
    }
}

impl std::error::Error for ParserError {}
