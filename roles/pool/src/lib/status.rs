//! ## Pool Status Reporting
//!
//! Tasks send a [`Status`] through a channel, tagged with a [`Sender`] to show where it came from.
//! The status loop in [`crate::PoolSv2`] decides what to do with it.

use super::error::PoolError;
use error_handling::ErrorBranch;

/// Each sending side of the status channel
/// should be wrapped with this enum to allow
/// the main thread to know which component sent the message
#[derive(Debug, Clone)]
pub enum Sender {
    /// A single downstream connection, carrying its connection id
    Downstream(u32, async_channel::Sender<Status>),
    DownstreamListener(async_channel::Sender<Status>),
    BlockGenerator(async_channel::Sender<Status>),
}

impl Sender {
    /// used to clone the sending side of the status channel used by the TCP Listener
    /// into individual Sender's for each Downstream instance
    pub fn listener_to_connection(&self, conn_uid: u32) -> Self {
        match self {
            Self::DownstreamListener(inner)
            | Self::BlockGenerator(inner)
            | Self::Downstream(_, inner) => Self::Downstream(conn_uid, inner.clone()),
        }
    }

    /// Same status channel, reported as the block generator.
    pub fn to_block_generator(&self) -> Self {
        match self {
            Self::DownstreamListener(inner)
            | Self::BlockGenerator(inner)
            | Self::Downstream(_, inner) => Self::BlockGenerator(inner.clone()),
        }
    }

    /// Sends a status message.
    pub async fn send(&self, status: Status) -> Result<(), async_channel::SendError<Status>> {
        match self {
            Self::Downstream(_, inner) => inner.send(status).await,
            Self::DownstreamListener(inner) => inner.send(status).await,
            Self::BlockGenerator(inner) => inner.send(status).await,
        }
    }
}

#[derive(Debug)]
pub enum State {
    /// The listener accepting downstream connections stopped.
    DownstreamShutdown(PoolError),
    /// The task generating new blocks stopped.
    BlockGeneratorShutdown(PoolError),
    /// A downstream connection is gone, its channels must be released.
    DownstreamInstanceDropped(u32),
    /// A non fatal event worth reporting.
    Healthy(String),
}

/// Status message sent to the main thread's status loop for monitoring connection states.
#[derive(Debug)]
pub struct Status {
    pub state: State,
}

// Wraps the error in the `State` variant matching the component that hit it, so the status loop
// can decide what should happen
async fn send_status(sender: &Sender, e: PoolError, outcome: ErrorBranch) -> ErrorBranch {
    let state = match (sender, outcome) {
        (Sender::Downstream(conn_uid, _), ErrorBranch::Break) => {
            tracing::warn!("Connection {}: {}", conn_uid, e);
            State::DownstreamInstanceDropped(*conn_uid)
        }
        (Sender::Downstream(conn_uid, _), ErrorBranch::Continue) => {
            State::Healthy(format!("Connection {}: {}", conn_uid, e))
        }
        (Sender::DownstreamListener(_), ErrorBranch::Break) => State::DownstreamShutdown(e),
        (Sender::BlockGenerator(_), ErrorBranch::Break) => State::BlockGeneratorShutdown(e),
        (_, ErrorBranch::Continue) => State::Healthy(e.to_string()),
    };
    sender.send(Status { state }).await.unwrap_or(());
    outcome
}

/// This function is called by `error_handling::handle_result!`
pub async fn handle_error(sender: &Sender, e: PoolError) -> ErrorBranch {
    tracing::debug!("Error: {:?}", &e);
    if e.is_fatal() {
        send_status(sender, e, ErrorBranch::Break).await
    } else {
        // a failed send to one downstream must not stop the loop serving the others
        send_status(sender, e, ErrorBranch::Continue).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn violations_keep_the_connection() {
        let (tx, rx) = async_channel::unbounded();
        let sender = Sender::DownstreamListener(tx).listener_to_connection(7);
        let branch = handle_error(&sender, PoolError::ProtocolViolation("x".into())).await;
        assert_eq!(branch, ErrorBranch::Continue);
        assert!(matches!(rx.recv().await.unwrap().state, State::Healthy(_)));

        let branch = handle_error(
            &sender,
            PoolError::Network(network_helpers_sv2::Error::SocketClosed),
        )
        .await;
        assert_eq!(branch, ErrorBranch::Break);
        assert!(matches!(
            rx.recv().await.unwrap().state,
            State::DownstreamInstanceDropped(7)
        ));
    }

    #[tokio::test]
    async fn listener_failure_shuts_down() {
        let (tx, rx) = async_channel::unbounded();
        let sender = Sender::DownstreamListener(tx);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "accept");
        assert_eq!(
            handle_error(&sender, PoolError::Io(io)).await,
            ErrorBranch::Break
        );
        assert!(matches!(
            rx.recv().await.unwrap().state,
            State::DownstreamShutdown(PoolError::Io(_))
        ));
    }
}
