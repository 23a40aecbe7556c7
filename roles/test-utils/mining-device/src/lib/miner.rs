//! Simulated hashing. A device of speed `S` GH/s finds a share of difficulty `D` on average every
//! `D * 2^32 / (S * 10^9)` seconds, the miner sleeps that long and submits a share.
use async_channel::Sender;
use framing_sv2::Sv2Frame;
use mining_sv2::{SubmitSharesStandard, Target};
use parsers_sv2::AnyMessage;
use rand::Rng;
use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::{debug, warn};

/// Hashes needed on average to find a share of difficulty 1, in GH.
pub const GH_PER_DIFF_1_SHARE: f64 = 4.294967296;

/// Job being mined on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Work {
    pub channel_id: u32,
    pub job_id: u32,
    pub version: u32,
    pub difficulty: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Miner {
    speed_ghps: f64,
    randomize: bool,
}

impl Miner {
    /// With `randomize` the time between shares is exponentially distributed around its mean,
    /// otherwise every share takes exactly the mean time.
    pub fn new(speed_ghps: f64, randomize: bool) -> Self {
        Self {
            speed_ghps,
            randomize,
        }
    }

    pub fn speed_ghps(&self) -> f64 {
        self.speed_ghps
    }

    /// Mean time to find a share of `difficulty`. `None` if the device can not hash.
    pub fn avg_share_time(&self, difficulty: u64) -> Option<Duration> {
        if !self.speed_ghps.is_finite() || self.speed_ghps <= 0.0 {
            return None;
        }
        let secs = difficulty.max(1) as f64 * GH_PER_DIFF_1_SHARE / self.speed_ghps;
        Duration::try_from_secs_f64(secs).ok()
    }

    pub fn next_share_delay<R: Rng>(&self, difficulty: u64, rng: &mut R) -> Option<Duration> {
        let avg = self.avg_share_time(difficulty)?;
        if !self.randomize {
            return Some(avg);
        }
        // u in (0, 1]
        let u: f64 = 1.0 - rng.gen::<f64>();
        Duration::try_from_secs_f64(avg.as_secs_f64() * -u.ln()).ok()
    }

    /// Easiest target the device accepts: one share at most every `min_share_interval`.
    pub fn max_target(&self, min_share_interval: Duration) -> Target {
        let difficulty =
            self.speed_ghps * min_share_interval.as_secs_f64() / GH_PER_DIFF_1_SHARE;
        Target::from_difficulty((difficulty as u64).max(1))
    }

    /// Submits shares for `work` until the connection goes away. Sequence numbers are shared by
    /// every job mined on the connection.
    pub async fn mine(self, work: Work, sender: Sender<Sv2Frame>, sequence_numbers: Arc<AtomicU32>) {
        debug!(
            "Mining job {} on channel {} at difficulty {}",
            work.job_id, work.channel_id, work.difficulty
        );
        loop {
            let delay = match self.next_share_delay(work.difficulty, &mut rand::thread_rng()) {
                Some(delay) => delay,
                None => {
                    warn!("Device speed {} GH/s can not mine", self.speed_ghps);
                    return;
                }
            };
            tokio::time::sleep(delay).await;
            let share = SubmitSharesStandard {
                channel_id: work.channel_id,
                sequence_number: sequence_numbers.fetch_add(1, Ordering::Relaxed),
                job_id: work.job_id,
                nonce: rand::random(),
                ntime: now(),
                version: work.version,
            };
            let frame = match AnyMessage::from(share).to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Share not encoded: {:?}", e);
                    return;
                }
            };
            if sender.send(frame).await.is_err() {
                debug!("Connection closed, job {} no longer mined", work.job_id);
                return;
            }
        }
    }
}

fn now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or_default()
}
