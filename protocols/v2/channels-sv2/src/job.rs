//! Jobs handed out on a channel and the registry that remembers them.
//!
//! Jobs are never forgotten: when a new block arrives every active job is moved to the retired
//! map, so a late share can still be told apart from a share for a job that never existed.
use crate::error::ChannelError;
use binary_sv2::U256;
use mining_sv2::Target;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningJob {
    pub uid: u32,
    pub target: Target,
    pub version: u32,
    pub merkle_root: U256,
}

impl MiningJob {
    /// Difficulty a share for this job is worth
    pub fn difficulty(&self) -> u64 {
        self.target.to_difficulty()
    }
}

#[derive(Debug, Default)]
pub struct JobRegistry {
    next_job_uid: u32,
    jobs: HashMap<u32, MiningJob>,
    retired_jobs: HashMap<u32, MiningJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new active job. Without `job_uid` the registry picks the next free id.
    ///
    /// Returns `None` when a job with the same id is already active.
    pub fn new_mining_job(
        &mut self,
        target: Target,
        version: u32,
        merkle_root: U256,
        job_uid: Option<u32>,
    ) -> Option<MiningJob> {
        let uid = match job_uid {
            Some(uid) => uid,
            None => self.next_job_uid(),
        };
        if self.jobs.contains_key(&uid) {
            return None;
        }
        let job = MiningJob {
            uid,
            target,
            version,
            merkle_root,
        };
        self.jobs.insert(uid, job.clone());
        Some(job)
    }

    /// Makes a job created earlier active again, e.g. a future job after a block change.
    pub fn add_job(&mut self, job: MiningJob) -> Result<(), ChannelError> {
        if self.jobs.contains_key(&job.uid) {
            return Err(ChannelError::DuplicateJob(job.uid));
        }
        self.jobs.insert(job.uid, job);
        Ok(())
    }

    pub fn get_job(&self, job_uid: u32) -> Option<&MiningJob> {
        self.jobs.get(&job_uid)
    }

    pub fn job_target(&self, job_uid: u32) -> Option<Target> {
        self.jobs.get(&job_uid).map(|job| job.target)
    }

    pub fn retired_job_target(&self, job_uid: u32) -> Option<Target> {
        self.retired_jobs.get(&job_uid).map(|job| job.target)
    }

    pub fn contains(&self, job_uid: u32) -> bool {
        self.jobs.contains_key(&job_uid)
    }

    pub fn contains_retired(&self, job_uid: u32) -> bool {
        self.retired_jobs.contains_key(&job_uid)
    }

    /// Moves every active job to the retired map, leaving no active job.
    pub fn retire_all_jobs(&mut self) {
        self.retired_jobs.extend(self.jobs.drain());
    }

    /// Forgets every retired job.
    pub fn drop_retired_jobs(&mut self) {
        self.retired_jobs.clear();
    }

    pub fn active_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn retired_count(&self) -> usize {
        self.retired_jobs.len()
    }

    fn next_job_uid(&mut self) -> u32 {
        let uid = self.next_job_uid;
        self.next_job_uid = self.next_job_uid.wrapping_add(1);
        uid
    }
}
