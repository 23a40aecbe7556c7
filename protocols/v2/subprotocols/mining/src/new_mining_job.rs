use binary_sv2::{impl_sv2_codec, Seq0255, B064K, U256};
use core::fmt;

/// Job for a standard channel. A future job only becomes active once a `SetNewPrevHash`
/// referencing it is received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMiningJob {
    pub channel_id: u32,
    pub job_id: u32,
    pub future_job: bool,
    pub version: u32,
    pub merkle_root: U256,
}

impl_sv2_codec!(NewMiningJob {
    channel_id,
    job_id,
    future_job,
    version,
    merkle_root,
});

impl fmt::Display for NewMiningJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NewMiningJob(channel_id: {}, job_id: {}, future_job: {}, version: 0x{:08x})",
            self.channel_id, self.job_id, self.future_job, self.version
        )
    }
}

impl NewMiningJob {
    pub fn is_future(&self) -> bool {
        self.future_job
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExtendedMiningJob {
    pub channel_id: u32,
    pub job_id: u32,
    pub future_job: bool,
    pub version: u32,
    pub version_rolling_allowed: bool,
    pub merkle_path: Seq0255<U256>,
    pub coinbase_tx_prefix: B064K,
    pub coinbase_tx_suffix: B064K,
}

impl_sv2_codec!(NewExtendedMiningJob {
    channel_id,
    job_id,
    future_job,
    version,
    version_rolling_allowed,
    merkle_path,
    coinbase_tx_prefix,
    coinbase_tx_suffix,
});

impl NewExtendedMiningJob {
    pub fn is_future(&self) -> bool {
        self.future_job
    }
}
