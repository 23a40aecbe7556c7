//! Difficulty authority of one channel.
//!
//! A [`MiningSession`] owns the current target and the [`JobRegistry`] of its channel. Once
//! [`MiningSession::run`] is called it measures the submitted shares and, when vardiff is
//! enabled, retargets the channel once per meter window so that the observed submit rate moves
//! towards [`VardiffConfig::desired_submits_per_sec`].
use crate::{
    error::ChannelError,
    hashrate_meter::{HashrateMeter, DEFAULT_METER_WINDOW},
    job::{JobRegistry, MiningJob},
    utils::Mutex,
};
use binary_sv2::U256;
use mining_sv2::Target;
use std::{sync::Arc, time::Duration};
use tokio::task::AbortHandle;
use tracing::{debug, error, warn};

/// Smallest correction applied in one vardiff window
pub const MIN_FACTOR: f64 = 0.25;
/// Largest correction applied in one vardiff window
pub const MAX_FACTOR: f64 = 4.0;
/// Correction used when no share was seen during a whole window
pub const NO_SHARES_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct VardiffConfig {
    pub enabled: bool,
    pub desired_submits_per_sec: f64,
    pub window: Duration,
}

impl Default for VardiffConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            desired_submits_per_sec: 0.3,
            window: DEFAULT_METER_WINDOW,
        }
    }
}

impl VardiffConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Factor the target is divided by after a window with `observed` submits per second.
pub fn vardiff_factor(observed: Option<f64>, desired_submits_per_sec: f64) -> f64 {
    match observed {
        None => NO_SHARES_FACTOR,
        Some(_) if desired_submits_per_sec <= 0.0 || !desired_submits_per_sec.is_finite() => 1.0,
        Some(rate) if rate.is_nan() => NO_SHARES_FACTOR,
        Some(rate) => (rate / desired_submits_per_sec).clamp(MIN_FACTOR, MAX_FACTOR),
    }
}

#[derive(Debug)]
pub struct MiningSession {
    name: String,
    target: Target,
    job_registry: JobRegistry,
    meter: Option<HashrateMeter>,
    vardiff: VardiffConfig,
    vardiff_task: Option<AbortHandle>,
}

impl MiningSession {
    pub fn new(name: impl Into<String>, target: Target, vardiff: VardiffConfig) -> Self {
        Self {
            name: name.into(),
            target,
            job_registry: JobRegistry::new(),
            meter: None,
            vardiff,
            vardiff_task: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn set_target(&mut self, target: Target) {
        self.target = target;
    }

    pub fn difficulty(&self) -> u64 {
        self.target.to_difficulty()
    }

    pub fn is_running(&self) -> bool {
        self.meter.is_some()
    }

    /// Creates a job at the current session target
    pub fn new_mining_job(
        &mut self,
        version: u32,
        merkle_root: U256,
        job_uid: Option<u32>,
    ) -> Option<MiningJob> {
        self.job_registry
            .new_mining_job(self.target, version, merkle_root, job_uid)
    }

    pub fn job_registry(&self) -> &JobRegistry {
        &self.job_registry
    }

    pub fn job_registry_mut(&mut self) -> &mut JobRegistry {
        &mut self.job_registry
    }

    /// Records a submitted share of difficulty `difficulty` in the session meter.
    pub fn account_diff_shares(&mut self, difficulty: u64) -> Result<(), ChannelError> {
        match self.meter.as_mut() {
            Some(meter) => {
                meter.measure(difficulty);
                Ok(())
            }
            None => Err(ChannelError::SessionNotRunning),
        }
    }

    /// Speed in GH/s of the shares accounted during the last window
    pub fn speed(&mut self) -> Option<f64> {
        self.meter.as_mut().and_then(|m| m.get_speed())
    }

    /// Runs one vardiff step. Returns the new target if it changed.
    pub fn adjust_difficulty(&mut self) -> Result<Option<Target>, ChannelError> {
        let meter = self.meter.as_mut().ok_or(ChannelError::SessionNotRunning)?;
        let observed = meter.get_submits_per_sec();
        let factor = vardiff_factor(observed, self.vardiff.desired_submits_per_sec);
        let new_target = self.target.div_by_factor(factor);
        debug!(
            "{}: submits/s {:?}, vardiff factor {:.3}, difficulty {} -> {}",
            self.name,
            observed,
            factor,
            self.target.to_difficulty(),
            new_target.to_difficulty()
        );
        if new_target == self.target {
            return Ok(None);
        }
        self.target = new_target;
        Ok(Some(new_target))
    }

    /// Starts the session: shares can be accounted from now on and, if vardiff is enabled, a
    /// task calls `on_target_change` with every new target. Must be called inside a tokio
    /// runtime when vardiff is enabled.
    pub fn run<F>(self_: Arc<Mutex<Self>>, on_target_change: F) -> Result<(), ChannelError>
    where
        F: FnMut(Target) + Send + 'static,
    {
        let vardiff = self_.safe_lock(|s| {
            s.meter = Some(HashrateMeter::new(s.vardiff.window));
            s.vardiff.clone()
        })?;
        if !vardiff.enabled {
            return Ok(());
        }
        let task = tokio::spawn(Self::vardiff_loop(
            self_.clone(),
            vardiff.window,
            on_target_change,
        ));
        let previous = self_.safe_lock(|s| s.vardiff_task.replace(task.abort_handle()))?;
        if let Some(previous) = previous {
            previous.abort();
        }
        Ok(())
    }

    async fn vardiff_loop<F>(self_: Arc<Mutex<Self>>, window: Duration, mut on_target_change: F)
    where
        F: FnMut(Target) + Send + 'static,
    {
        let mut interval = tokio::time::interval(window);
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            match self_.safe_lock(|s| s.adjust_difficulty()) {
                Ok(Ok(Some(target))) => on_target_change(target),
                Ok(Ok(None)) => (),
                Ok(Err(e)) => {
                    warn!("Vardiff stopped: {}", e);
                    break;
                }
                Err(e) => {
                    error!("Vardiff stopped: {}", e);
                    break;
                }
            }
        }
    }

    /// Stops the vardiff loop, shares can no longer be accounted.
    pub fn terminate(&mut self) {
        if let Some(task) = self.vardiff_task.take() {
            task.abort();
        }
        self.meter = None;
    }
}

impl Drop for MiningSession {
    fn drop(&mut self) {
        if let Some(task) = self.vardiff_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn session(difficulty: u64, vardiff: VardiffConfig) -> Arc<Mutex<MiningSession>> {
        Arc::new(Mutex::new(MiningSession::new(
            "test",
            Target::from_difficulty(difficulty),
            vardiff,
        )))
    }

    #[quickcheck]
    fn factor_is_clamped(observed: Option<f64>, desired: u16) -> bool {
        let factor = vardiff_factor(observed, desired as f64 / 100.0);
        (MIN_FACTOR..=MAX_FACTOR).contains(&factor)
    }

    #[quickcheck]
    fn factor_moves_target_the_right_way(submits: u32, difficulty: u32) -> bool {
        let target = Target::from_difficulty(difficulty as u64 + 2);
        let factor = vardiff_factor(Some(submits as f64 / 1000.0), 0.3);
        let new = target.div_by_factor(factor);
        if factor > 1.0 {
            new < target
        } else if factor < 1.0 {
            new > target
        } else {
            new == target
        }
    }

    #[test]
    fn no_shares_halves_difficulty() {
        assert_eq!(vardiff_factor(None, 0.3), NO_SHARES_FACTOR);
        let mut s = MiningSession::new(
            "s",
            Target::from_difficulty(1000),
            VardiffConfig::disabled(),
        );
        assert_eq!(
            s.adjust_difficulty(),
            Err(ChannelError::SessionNotRunning)
        );
        s.meter = Some(HashrateMeter::default());
        let new = s.adjust_difficulty().unwrap().unwrap();
        assert_eq!(new.to_difficulty(), 500);
        assert_eq!(s.target(), new);
    }

    #[test]
    fn shares_need_a_running_session() {
        let s = session(10, VardiffConfig::disabled());
        assert_eq!(
            s.safe_lock(|s| s.account_diff_shares(10)).unwrap(),
            Err(ChannelError::SessionNotRunning)
        );
        MiningSession::run(s.clone(), |_| ()).unwrap();
        assert!(s.safe_lock(|s| s.account_diff_shares(10)).unwrap().is_ok());
        s.safe_lock(|s| s.terminate()).unwrap();
        assert!(!s.safe_lock(|s| s.is_running()).unwrap());
    }

    #[tokio::test]
    async fn vardiff_loop_reports_new_targets() {
        let vardiff = VardiffConfig {
            enabled: true,
            desired_submits_per_sec: 0.3,
            window: Duration::from_millis(20),
        };
        let s = session(1000, vardiff);
        let initial = s.safe_lock(|s| s.target()).unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        MiningSession::run(s.clone(), move |target| {
            let _ = tx.send(target);
        })
        .unwrap();

        let new = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(new > initial);

        s.safe_lock(|s| s.terminate()).unwrap();
        // drain what was sent before the abort, then the loop is gone
        tokio::time::sleep(Duration::from_millis(50)).await;
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }
}
