//! # Mining Protocol
//!
//! Messages exchanged between a mining device (or proxy) and a pool over a mining connection.
//!
//! A connection carries one or more channels. A *standard* channel gets a merkle root per job and
//! only searches nonce, ntime and version. *Extended* channels get the coinbase and the merkle
//! path and are able to roll extranonce too. *Group* channels bundle standard channels so a job
//! can be sent once for all of them.
//!
//! Jobs may be sent ahead of time as *future* jobs: they become active only when a
//! [`SetNewPrevHash`] referencing them arrives. Every job sent after a [`SetTarget`] must be
//! mined at the new target.
//!
//! Shares are submitted with [`SubmitSharesStandard`] and acknowledged in batches with
//! [`SubmitSharesSuccess`], or refused one by one with [`SubmitSharesError`].
mod close_channel;
mod new_mining_job;
mod open_channel;
mod reconnect;
mod set_custom_mining_job;
mod set_extranonce_prefix;
mod set_group_channel;
mod set_new_prev_hash;
mod set_target;
mod submit_shares;
pub mod target;
mod update_channel;

pub use close_channel::CloseChannel;
pub use new_mining_job::{NewExtendedMiningJob, NewMiningJob};
pub use open_channel::{
    OpenExtendedMiningChannel, OpenExtendedMiningChannelSuccess, OpenMiningChannelError,
    OpenStandardMiningChannel, OpenStandardMiningChannelSuccess,
};
pub use reconnect::Reconnect;
pub use set_custom_mining_job::{
    SetCustomMiningJob, SetCustomMiningJobError, SetCustomMiningJobSuccess,
};
pub use set_extranonce_prefix::SetExtranoncePrefix;
pub use set_group_channel::SetGroupChannel;
pub use set_new_prev_hash::SetNewPrevHash;
pub use set_target::SetTarget;
pub use submit_shares::{
    SubmitSharesError, SubmitSharesExtended, SubmitSharesStandard, SubmitSharesSuccess,
};
pub use target::Target;
pub use update_channel::{UpdateChannel, UpdateChannelError};

#[cfg(test)]
mod test {
    use super::*;
    use binary_sv2::{from_bytes, to_bytes, u256_from_int, Seq0255, B0255, B064K, U256};
    use core::convert::TryInto;

    #[test]
    fn open_standard_mining_channel_layout() {
        let message = OpenStandardMiningChannel {
            request_id: 7,
            user_identity: "miner".try_into().unwrap(),
            nominal_hash_rate: 1.0e12,
            max_target: [0xff; 32].into(),
        };
        let bytes = to_bytes(&message).unwrap();
        assert_eq!(bytes.len(), 4 + 6 + 4 + 32);
        assert_eq!(&bytes[10..14], &1.0e12_f32.to_le_bytes());
        assert_eq!(from_bytes::<OpenStandardMiningChannel>(&bytes).unwrap(), message);
    }

    #[test]
    fn new_mining_job_layout() {
        let message = NewMiningJob {
            channel_id: 1,
            job_id: 2,
            future_job: true,
            version: 0x2000_0000,
            merkle_root: u256_from_int(3_u32),
        };
        let bytes = to_bytes(&message).unwrap();
        assert_eq!(bytes.len(), 4 + 4 + 1 + 4 + 32);
        assert_eq!(bytes[8], 1);
        assert_eq!(from_bytes::<NewMiningJob>(&bytes).unwrap(), message);
        assert!(from_bytes::<NewMiningJob>(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn set_custom_mining_job_with_max_lengths() {
        let message = SetCustomMiningJob {
            channel_id: 1,
            request_id: 2,
            mining_job_token: B0255::try_from(vec![1; 255]).unwrap(),
            version: 3,
            prev_hash: U256::from([4; 32]),
            min_ntime: 5,
            nbits: 6,
            coinbase_tx_version: 2,
            coinbase_prefix: B0255::default(),
            coinbase_tx_input_n_sequence: u32::MAX,
            coinbase_tx_value_remaining: u64::MAX,
            coinbase_tx_outputs: B064K::try_from(vec![9; 1000]).unwrap(),
            coinbase_tx_locktime: 0,
            merkle_path: Seq0255::new(vec![U256::from([8; 32]); 255]).unwrap(),
            extranonce_size: 16,
            future_job: false,
        };
        let bytes = to_bytes(&message).unwrap();
        assert_eq!(from_bytes::<SetCustomMiningJob>(&bytes).unwrap(), message);
    }

    #[test]
    fn submit_shares_error_codes() {
        let error = SubmitSharesError::new(1, 2, SubmitSharesError::stale_share_error_code());
        assert_eq!(error.error_code.as_str(), "stale-share");
        let error = OpenMiningChannelError::new_max_target_out_of_range(4);
        assert_eq!(error.error_code.as_str(), "max-target-out-of-range");
    }
}
