use binary_sv2::U256;
use channels_sv2::HashrateMeter;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Share counters of the whole pool.
#[derive(Debug)]
pub struct ShareStats {
    accepted_submits: u64,
    accepted_shares: u64,
    stale_submits: u64,
    stale_shares: u64,
    rejected_submits: u64,
    accepted_meter: HashrateMeter,
    stale_meter: HashrateMeter,
}

impl ShareStats {
    pub fn new(meter_window: Duration) -> Self {
        Self {
            accepted_submits: 0,
            accepted_shares: 0,
            stale_submits: 0,
            stale_shares: 0,
            rejected_submits: 0,
            accepted_meter: HashrateMeter::new(meter_window),
            stale_meter: HashrateMeter::new(meter_window),
        }
    }

    pub fn accept(&mut self, difficulty: u64) {
        self.accepted_submits += 1;
        self.accepted_shares = self.accepted_shares.saturating_add(difficulty);
        self.accepted_meter.measure(difficulty);
    }

    pub fn stale(&mut self, difficulty: u64) {
        self.stale_submits += 1;
        self.stale_shares = self.stale_shares.saturating_add(difficulty);
        self.stale_meter.measure(difficulty);
    }

    pub fn reject(&mut self) {
        self.rejected_submits += 1;
    }

    pub fn accepted_submits(&self) -> u64 {
        self.accepted_submits
    }

    pub fn accepted_shares(&self) -> u64 {
        self.accepted_shares
    }

    pub fn stale_submits(&self) -> u64 {
        self.stale_submits
    }

    pub fn stale_shares(&self) -> u64 {
        self.stale_shares
    }

    pub fn rejected_submits(&self) -> u64 {
        self.rejected_submits
    }

    /// One line summary of the accepted and stale speed over the meter window.
    pub fn report(&mut self) -> String {
        format!(
            "accepted: {}, stale: {}, rejected submits: {}",
            speed_line(&mut self.accepted_meter),
            speed_line(&mut self.stale_meter),
            self.rejected_submits
        )
    }
}

fn speed_line(meter: &mut HashrateMeter) -> String {
    match (meter.get_speed(), meter.get_submits_per_sec()) {
        (Some(speed), Some(submits)) => format!("SPEED: {:.2} Gh/s, {:.4} submits/s", speed, submits),
        _ => "SPEED: N/A Gh/s, N/A submits/s".to_string(),
    }
}

/// Tip every job of the pool is built on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrevHash {
    pub prev_hash: U256,
    pub min_ntime: u32,
    pub nbits: u32,
}

impl PrevHash {
    /// A simulated block: the hash of random bytes, found now.
    pub fn random() -> Self {
        let seed: [u8; 32] = rand::thread_rng().gen();
        let mut hash = [0_u8; 32];
        hash.copy_from_slice(&Sha256::digest(seed));
        let min_ntime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default();
        Self {
            prev_hash: hash.into(),
            min_ntime,
            nbits: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_outcomes() {
        let mut stats = ShareStats::new(Duration::from_secs(60));
        stats.accept(4);
        stats.accept(2);
        stats.stale(8);
        stats.reject();
        assert_eq!(stats.accepted_submits(), 2);
        assert_eq!(stats.accepted_shares(), 6);
        assert_eq!((stats.stale_submits(), stats.stale_shares()), (1, 8));
        assert_eq!(stats.rejected_submits(), 1);
        assert!(stats.report().starts_with("accepted: SPEED: "));
    }

    #[test]
    fn empty_meters_report_na() {
        let mut stats = ShareStats::new(Duration::from_secs(60));
        assert_eq!(
            stats.report(),
            "accepted: SPEED: N/A Gh/s, N/A submits/s, stale: SPEED: N/A Gh/s, N/A submits/s, \
             rejected submits: 0"
        );
    }

    #[test]
    fn blocks_differ() {
        assert_ne!(PrevHash::random().prev_hash, PrevHash::random().prev_hash);
    }
}
