use binary_sv2::{impl_sv2_codec, Str0255, B032, U256};

/// Sent by a downstream to open a standard channel. `max_target` is the easiest target the
/// downstream is willing to work on.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenStandardMiningChannel {
    pub request_id: u32,
    pub user_identity: Str0255,
    /// Expected hashrate of the device in h/s
    pub nominal_hash_rate: f32,
    pub max_target: U256,
}

impl_sv2_codec!(OpenStandardMiningChannel {
    request_id,
    user_identity,
    nominal_hash_rate,
    max_target,
});

impl OpenStandardMiningChannel {
    pub fn get_request_id_as_u32(&self) -> u32 {
        self.request_id
    }

    pub fn update_id(&mut self, new_id: u32) {
        self.request_id = new_id;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenStandardMiningChannelSuccess {
    pub request_id: u32,
    pub channel_id: u32,
    /// Initial target of the channel
    pub target: U256,
    pub extranonce_prefix: B032,
    pub group_channel_id: u32,
}

impl_sv2_codec!(OpenStandardMiningChannelSuccess {
    request_id,
    channel_id,
    target,
    extranonce_prefix,
    group_channel_id,
});

#[derive(Debug, Clone, PartialEq)]
pub struct OpenExtendedMiningChannel {
    pub request_id: u32,
    pub user_identity: Str0255,
    pub nominal_hash_rate: f32,
    pub max_target: U256,
    pub min_extranonce_size: u16,
}

impl_sv2_codec!(OpenExtendedMiningChannel {
    request_id,
    user_identity,
    nominal_hash_rate,
    max_target,
    min_extranonce_size,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenExtendedMiningChannelSuccess {
    pub request_id: u32,
    pub channel_id: u32,
    pub target: U256,
    pub extranonce_size: u16,
    pub extranonce_prefix: B032,
}

impl_sv2_codec!(OpenExtendedMiningChannelSuccess {
    request_id,
    channel_id,
    target,
    extranonce_size,
    extranonce_prefix,
});

/// Reply to a refused open channel request, for both standard and extended channels.
///
/// Known error codes: `unknown-user`, `max-target-out-of-range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMiningChannelError {
    pub request_id: u32,
    pub error_code: Str0255,
}

impl_sv2_codec!(OpenMiningChannelError {
    request_id,
    error_code,
});

impl OpenMiningChannelError {
    pub fn new_max_target_out_of_range(request_id: u32) -> Self {
        Self {
            request_id,
            // literal is shorter than 255 bytes
            error_code: Str0255::try_from("max-target-out-of-range").unwrap_or_default(),
        }
    }
}
