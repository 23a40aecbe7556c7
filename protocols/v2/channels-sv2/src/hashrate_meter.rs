use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

/// Hashes per share of difficulty 1, in GH
const GHASH_PER_DIFF_1_SHARE: f64 = 4.294967296;

pub const DEFAULT_METER_WINDOW: Duration = Duration::from_secs(60);

/// Rolling window of submitted share difficulties.
#[derive(Debug, Clone)]
pub struct HashrateMeter {
    window: Duration,
    submits: VecDeque<(Instant, u64)>,
}

impl Default for HashrateMeter {
    fn default() -> Self {
        Self::new(DEFAULT_METER_WINDOW)
    }
}

impl HashrateMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            submits: VecDeque::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn measure(&mut self, difficulty: u64) {
        self.measure_at(Instant::now(), difficulty)
    }

    pub fn measure_at(&mut self, now: Instant, difficulty: u64) {
        self.submits.push_back((now, difficulty));
        self.expire(now);
    }

    /// Submits per second over the window, `None` when nothing was submitted.
    pub fn get_submits_per_sec(&mut self) -> Option<f64> {
        self.get_submits_per_sec_at(Instant::now())
    }

    pub fn get_submits_per_sec_at(&mut self, now: Instant) -> Option<f64> {
        self.expire(now);
        if self.submits.is_empty() {
            return None;
        }
        Some(self.submits.len() as f64 / self.window_secs())
    }

    /// Estimated speed in GH/s, `None` when nothing was submitted.
    pub fn get_speed(&mut self) -> Option<f64> {
        self.get_speed_at(Instant::now())
    }

    pub fn get_speed_at(&mut self, now: Instant) -> Option<f64> {
        self.expire(now);
        if self.submits.is_empty() {
            return None;
        }
        let difficulty_sum: f64 = self.submits.iter().map(|(_, d)| *d as f64).sum();
        Some(difficulty_sum * GHASH_PER_DIFF_1_SHARE / self.window_secs())
    }

    fn window_secs(&self) -> f64 {
        self.window.as_secs_f64().max(f64::EPSILON)
    }

    fn expire(&mut self, now: Instant) {
        while let Some((at, _)) = self.submits.front() {
            if now.saturating_duration_since(*at) > self.window {
                self.submits.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_meter_has_no_rate() {
        let mut meter = HashrateMeter::new(Duration::from_secs(10));
        assert_eq!(meter.get_submits_per_sec(), None);
        assert_eq!(meter.get_speed(), None);
    }

    #[test]
    fn rates_over_window() {
        let start = Instant::now();
        let mut meter = HashrateMeter::new(Duration::from_secs(10));
        for i in 0..5 {
            meter.measure_at(start + Duration::from_secs(i), 1000);
        }
        let now = start + Duration::from_secs(5);
        assert_eq!(meter.get_submits_per_sec_at(now), Some(0.5));
        let speed = meter.get_speed_at(now).unwrap();
        assert!((speed - 5000.0 * 4.294967296 / 10.0).abs() < 1e-9);
    }

    #[test]
    fn old_submits_expire() {
        let start = Instant::now();
        let mut meter = HashrateMeter::new(Duration::from_secs(10));
        meter.measure_at(start, 1);
        meter.measure_at(start + Duration::from_secs(8), 1);
        assert_eq!(
            meter.get_submits_per_sec_at(start + Duration::from_secs(15)),
            Some(0.1)
        );
        assert_eq!(
            meter.get_submits_per_sec_at(start + Duration::from_secs(30)),
            None
        );
    }
}
