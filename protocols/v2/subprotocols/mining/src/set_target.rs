use binary_sv2::{impl_sv2_codec, U256};

/// New maximum target for the channel. Shares submitted on jobs received after this message must
/// meet it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetTarget {
    pub channel_id: u32,
    pub maximum_target: U256,
}

impl_sv2_codec!(SetTarget {
    channel_id,
    maximum_target,
});
