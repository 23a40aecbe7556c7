use parsers_sv2::ParserError;

/// What a handler error must be able to represent for the dispatch code to report it.
pub trait HandlerErrorType: std::fmt::Debug {
    /// The frame could not be turned into a message
    fn parse_error(error: ParserError) -> Self;
    /// The message is valid but this role does not handle it
    fn unexpected_message(message_type: u8) -> Self;
}

#[derive(Debug)]
pub enum HandlerError {
    UnexpectedMessage(u8),
    ParserError(ParserError),
    External(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerErrorType for HandlerError {
    fn parse_error(error: ParserError) -> Self {
        HandlerError::ParserError(error)
    }

    fn unexpected_message(message_type: u8) -> Self {
        HandlerError::UnexpectedMessage(message_type)
    }
}

impl From<ParserError> for HandlerError {
    fn from(value: ParserError) -> HandlerError {
        HandlerError::ParserError(value)
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerError::UnexpectedMessage(t) => write!(f, "No handler for message type {t:#04x}"),
            HandlerError::ParserError(e) => write!(f, "{e}"),
            HandlerError::External(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for HandlerError {}
