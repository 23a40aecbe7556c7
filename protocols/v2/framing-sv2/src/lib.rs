//! Sv2 framing.
//!
//! A frame is a 6 bytes [`header::Header`] followed by the encoded message. Frames are
//! transported inside noise datagrams, see `noise_sv2`.
mod error;
pub mod header;
mod sv2_frame;

pub use error::Error;
pub use header::Header;
pub use sv2_frame::Sv2Frame;
