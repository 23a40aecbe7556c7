use binary_sv2::{impl_sv2_codec, Seq064K};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetGroupChannel {
    pub group_channel_id: u32,
    pub channel_ids: Seq064K<u32>,
}

impl_sv2_codec!(SetGroupChannel {
    group_channel_id,
    channel_ids,
});
