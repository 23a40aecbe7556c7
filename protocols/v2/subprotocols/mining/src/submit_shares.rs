use binary_sv2::{impl_sv2_codec, Str0255, B032};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSharesStandard {
    pub channel_id: u32,
    pub sequence_number: u32,
    pub job_id: u32,
    pub nonce: u32,
    pub ntime: u32,
    pub version: u32,
}

impl_sv2_codec!(SubmitSharesStandard {
    channel_id,
    sequence_number,
    job_id,
    nonce,
    ntime,
    version,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSharesExtended {
    pub channel_id: u32,
    pub sequence_number: u32,
    pub job_id: u32,
    pub nonce: u32,
    pub ntime: u32,
    pub version: u32,
    pub extranonce: B032,
}

impl_sv2_codec!(SubmitSharesExtended {
    channel_id,
    sequence_number,
    job_id,
    nonce,
    ntime,
    version,
    extranonce,
});

/// Acknowledges every share up to `last_sequence_number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSharesSuccess {
    pub channel_id: u32,
    pub last_sequence_number: u32,
    pub new_submits_accepted_count: u32,
    /// Sum of the difficulty of the accepted shares
    pub new_shares_sum: u32,
}

impl_sv2_codec!(SubmitSharesSuccess {
    channel_id,
    last_sequence_number,
    new_submits_accepted_count,
    new_shares_sum,
});

/// Known error codes: `invalid-channel-id`, `stale-share`, `invalid-job-id`,
/// `difficulty-too-low`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSharesError {
    pub channel_id: u32,
    pub sequence_number: u32,
    pub error_code: Str0255,
}

impl_sv2_codec!(SubmitSharesError {
    channel_id,
    sequence_number,
    error_code,
});

impl SubmitSharesError {
    pub fn invalid_channel_error_code() -> &'static str {
        "invalid-channel-id"
    }

    pub fn stale_share_error_code() -> &'static str {
        "stale-share"
    }

    pub fn invalid_job_id_error_code() -> &'static str {
        "invalid-job-id"
    }

    pub fn new(channel_id: u32, sequence_number: u32, error_code: &'static str) -> Self {
        Self {
            channel_id,
            sequence_number,
            // every known error code is shorter than 255 bytes
            error_code: Str0255::try_from(error_code).unwrap_or_default(),
        }
    }
}
