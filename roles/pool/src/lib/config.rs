use mining_sv2::Target;
use noise_sv2::keys::{Ed25519PublicKey, Ed25519SecretKey};
use std::{path::PathBuf, time::Duration};

use crate::error::PoolError;

/// Represents the configuration of a Pool.
///
/// The pool listens for mining devices on [`PoolConfig::listen_address`] and authenticates itself
/// with a certificate signed by the authority keypair.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct PoolConfig {
    listen_address: String,
    authority_public_key: Ed25519PublicKey,
    authority_secret_key: Ed25519SecretKey,
    #[serde(default = "default_cert_validity_sec")]
    cert_validity_sec: u64,
    #[serde(default = "default_difficulty")]
    default_difficulty: u64,
    #[serde(default = "default_enable_vardiff")]
    enable_vardiff: bool,
    #[serde(default = "default_desired_submits_per_sec")]
    desired_submits_per_sec: f64,
    #[serde(default = "default_block_interval_secs")]
    block_interval_secs: u64,
    #[serde(default = "default_meter_period_secs")]
    meter_period_secs: u64,
    #[serde(skip)]
    log_file: Option<PathBuf>,
}

fn default_cert_validity_sec() -> u64 {
    const_sv2::DEFAULT_CERT_VALIDITY_SEC as u64
}

fn default_difficulty() -> u64 {
    1
}

fn default_enable_vardiff() -> bool {
    true
}

fn default_desired_submits_per_sec() -> f64 {
    0.3
}

fn default_block_interval_secs() -> u64 {
    60
}

fn default_meter_period_secs() -> u64 {
    60
}

/// Difficulty and vardiff settings of the channels opened on the pool.
pub struct ChannelsConfig {
    pub default_difficulty: u64,
    pub enable_vardiff: bool,
    pub desired_submits_per_sec: f64,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            default_difficulty: default_difficulty(),
            enable_vardiff: default_enable_vardiff(),
            desired_submits_per_sec: default_desired_submits_per_sec(),
        }
    }
}

impl PoolConfig {
    /// Creates a new instance of the [`PoolConfig`].
    pub fn new(
        listen_address: String,
        authority_public_key: Ed25519PublicKey,
        authority_secret_key: Ed25519SecretKey,
        cert_validity_sec: u64,
        channels: ChannelsConfig,
        block_interval_secs: u64,
        meter_period_secs: u64,
    ) -> Self {
        Self {
            listen_address,
            authority_public_key,
            authority_secret_key,
            cert_validity_sec,
            default_difficulty: channels.default_difficulty,
            enable_vardiff: channels.enable_vardiff,
            desired_submits_per_sec: channels.desired_submits_per_sec,
            block_interval_secs,
            meter_period_secs,
            log_file: None,
        }
    }

    /// Returns Pool listening address.
    pub fn listen_address(&self) -> &String {
        &self.listen_address
    }

    pub fn authority_public_key(&self) -> &Ed25519PublicKey {
        &self.authority_public_key
    }

    pub fn authority_secret_key(&self) -> &Ed25519SecretKey {
        &self.authority_secret_key
    }

    pub fn cert_validity(&self) -> Duration {
        Duration::from_secs(self.cert_validity_sec)
    }

    pub fn default_difficulty(&self) -> u64 {
        self.default_difficulty
    }

    /// Target every new channel starts at.
    pub fn default_target(&self) -> Target {
        Target::from_difficulty(self.default_difficulty)
    }

    pub fn enable_vardiff(&self) -> bool {
        self.enable_vardiff
    }

    pub fn desired_submits_per_sec(&self) -> f64 {
        self.desired_submits_per_sec
    }

    /// Time between two simulated blocks. Zero disables the block generator.
    pub fn block_interval(&self) -> Duration {
        Duration::from_secs(self.block_interval_secs)
    }

    /// Window of the pool share meters and period of the speed report.
    pub fn meter_period(&self) -> Duration {
        Duration::from_secs(self.meter_period_secs.max(1))
    }

    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    pub fn set_log_file(&mut self, log_file: Option<PathBuf>) {
        if log_file.is_some() {
            self.log_file = log_file;
        }
    }

    /// The public key handed to miners must be the one of the secret key signing certificates.
    pub fn check_authority_keypair(&self) -> Result<(), PoolError> {
        if self.authority_secret_key.public_key() != self.authority_public_key {
            return Err(PoolError::KeypairMismatch);
        }
        Ok(())
    }
}
