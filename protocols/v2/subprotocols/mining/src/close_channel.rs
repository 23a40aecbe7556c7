use binary_sv2::{impl_sv2_codec, Str0255};

/// Either side closes the channel, the receiver must stop all work on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseChannel {
    pub channel_id: u32,
    pub reason_code: Str0255,
}

impl_sv2_codec!(CloseChannel {
    channel_id,
    reason_code,
});
