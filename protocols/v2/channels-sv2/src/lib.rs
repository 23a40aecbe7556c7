//! # Channels Sv2
//!
//! State kept for every mining channel: the jobs handed out on it ([`JobRegistry`]), the
//! difficulty authority with its vardiff loop ([`MiningSession`]) and the channel itself with
//! its pending future job ([`MiningChannel`]).
//!
//! Ownership only runs downward: a [`ChannelRegistry`] owns its channels, a channel owns a
//! handle to its session and a session owns its job registry. Nothing points back up; the
//! vardiff callback is given whatever ids it needs to find its channel again.
pub mod channel;
pub mod error;
pub mod hashrate_meter;
pub mod job;
pub mod session;
pub mod utils;

pub use channel::{ChannelRegistry, MiningChannel};
pub use error::ChannelError;
pub use hashrate_meter::HashrateMeter;
pub use job::{JobRegistry, MiningJob};
pub use session::{vardiff_factor, MiningSession, VardiffConfig};
