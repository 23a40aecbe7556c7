use binary_sv2::impl_sv2_codec;

/// Sent by an upstream to notify that the endpoint of `channel_id` changed and the downstream
/// should expect messages for it from a different upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEndpointChanged {
    pub channel_id: u32,
}

impl_sv2_codec!(ChannelEndpointChanged { channel_id });
