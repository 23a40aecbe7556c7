use binary_sv2::{impl_sv2_codec, U256};

/// Announces a new chain tip. `job_id` names the future job that becomes active with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetNewPrevHash {
    pub channel_id: u32,
    pub job_id: u32,
    pub prev_hash: U256,
    pub min_ntime: u32,
    pub nbits: u32,
}

impl_sv2_codec!(SetNewPrevHash {
    channel_id,
    job_id,
    prev_hash,
    min_ntime,
    nbits,
});
