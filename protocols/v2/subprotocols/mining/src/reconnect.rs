use binary_sv2::{impl_sv2_codec, Str0255};

/// Asks the downstream to reconnect to `new_host:new_port`. Empty host means the same host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconnect {
    pub new_host: Str0255,
    pub new_port: u16,
}

impl_sv2_codec!(Reconnect { new_host, new_port });
