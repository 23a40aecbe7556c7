use std::{fmt, sync::PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// A job with this id is already active in the registry
    DuplicateJob(u32),
    /// The channel already holds a future job
    FutureJobAlreadySet(u32),
    /// The channel has no future job to take
    NoFutureJob(u32),
    /// Shares accounted before the session was started
    SessionNotRunning,
    PoisonLock(String),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ChannelError::*;
        match self {
            DuplicateJob(id) => write!(f, "Job `{}` already exists in the registry", id),
            FutureJobAlreadySet(id) => {
                write!(f, "Attempt to overwrite the future job of channel `{}`", id)
            }
            NoFutureJob(id) => write!(f, "Channel `{}` has no future job", id),
            SessionNotRunning => write!(f, "Mining session is not running"),
            PoisonLock(e) => write!(f, "Poison lock: {}", e),
        }
    }
}

impl std::error::Error for ChannelError {}

impl<T> From<PoisonError<T>> for ChannelError {
    fn from(e: PoisonError<T>) -> Self {
        ChannelError::PoisonLock(e.to_string())
    }
}
