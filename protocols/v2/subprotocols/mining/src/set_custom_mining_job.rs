use binary_sv2::{impl_sv2_codec, Seq0255, Str0255, B0255, B064K, U256};

/// Downstream proposed job, only meaningful on channels that negotiated custom jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCustomMiningJob {
    pub channel_id: u32,
    pub request_id: u32,
    pub mining_job_token: B0255,
    pub version: u32,
    pub prev_hash: U256,
    pub min_ntime: u32,
    pub nbits: u32,
    pub coinbase_tx_version: u32,
    pub coinbase_prefix: B0255,
    pub coinbase_tx_input_n_sequence: u32,
    pub coinbase_tx_value_remaining: u64,
    pub coinbase_tx_outputs: B064K,
    pub coinbase_tx_locktime: u32,
    pub merkle_path: Seq0255<U256>,
    pub extranonce_size: u16,
    pub future_job: bool,
}

impl_sv2_codec!(SetCustomMiningJob {
    channel_id,
    request_id,
    mining_job_token,
    version,
    prev_hash,
    min_ntime,
    nbits,
    coinbase_tx_version,
    coinbase_prefix,
    coinbase_tx_input_n_sequence,
    coinbase_tx_value_remaining,
    coinbase_tx_outputs,
    coinbase_tx_locktime,
    merkle_path,
    extranonce_size,
    future_job,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCustomMiningJobSuccess {
    pub channel_id: u32,
    pub request_id: u32,
    pub job_id: u32,
}

impl_sv2_codec!(SetCustomMiningJobSuccess {
    channel_id,
    request_id,
    job_id,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCustomMiningJobError {
    pub channel_id: u32,
    pub request_id: u32,
    pub error_code: Str0255,
}

impl_sv2_codec!(SetCustomMiningJobError {
    channel_id,
    request_id,
    error_code,
});
