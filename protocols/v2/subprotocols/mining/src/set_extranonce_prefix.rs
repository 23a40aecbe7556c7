use binary_sv2::{impl_sv2_codec, B032};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetExtranoncePrefix {
    pub channel_id: u32,
    pub extranonce_prefix: B032,
}

impl_sv2_codec!(SetExtranoncePrefix {
    channel_id,
    extranonce_prefix,
});
