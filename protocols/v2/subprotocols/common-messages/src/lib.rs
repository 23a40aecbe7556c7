//! Messages every Sv2 sub-protocol shares: connection setup and channel endpoint changes.
mod channel_endpoint_changed;
mod setup_connection;

pub use channel_endpoint_changed::ChannelEndpointChanged;
pub use setup_connection::{
    Protocol, SetupConnection, SetupConnectionError, SetupConnectionSuccess,
};
