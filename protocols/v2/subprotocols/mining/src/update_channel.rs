use binary_sv2::{impl_sv2_codec, Str0255, U256};

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateChannel {
    pub channel_id: u32,
    pub nominal_hash_rate: f32,
    pub maximum_target: U256,
}

impl_sv2_codec!(UpdateChannel {
    channel_id,
    nominal_hash_rate,
    maximum_target,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateChannelError {
    pub channel_id: u32,
    pub error_code: Str0255,
}

impl_sv2_codec!(UpdateChannelError {
    channel_id,
    error_code,
});
