use crate::{error::ChannelError, job::MiningJob, session::MiningSession, utils::Mutex};
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

/// Binds a [`MiningSession`] to a channel id on one connection.
///
/// The channel holds at most one future job: a job announced to the downstream before the
/// previous hash it will be mined on is known.
#[derive(Debug)]
pub struct MiningChannel {
    id: u32,
    conn_uid: u32,
    session: Arc<Mutex<MiningSession>>,
    future_job: Option<MiningJob>,
}

impl MiningChannel {
    pub fn new(id: u32, conn_uid: u32, session: Arc<Mutex<MiningSession>>) -> Self {
        Self {
            id,
            conn_uid,
            session,
            future_job: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn conn_uid(&self) -> u32 {
        self.conn_uid
    }

    pub fn session(&self) -> &Arc<Mutex<MiningSession>> {
        &self.session
    }

    pub fn has_future_job(&self) -> bool {
        self.future_job.is_some()
    }

    pub fn future_job(&self) -> Option<&MiningJob> {
        self.future_job.as_ref()
    }

    /// Empties the future job slot.
    pub fn take_future_job(&mut self) -> Result<MiningJob, ChannelError> {
        self.future_job
            .take()
            .ok_or(ChannelError::NoFutureJob(self.id))
    }

    /// Fills the future job slot, which must be empty.
    pub fn add_future_job(&mut self, job: MiningJob) -> Result<(), ChannelError> {
        if self.future_job.is_some() {
            return Err(ChannelError::FutureJobAlreadySet(self.id));
        }
        self.future_job = Some(job);
        Ok(())
    }

    pub fn terminate(&mut self) -> Result<(), ChannelError> {
        debug!("Connection {}: terminating channel {}", self.conn_uid, self.id);
        self.future_job = None;
        self.session.safe_lock(|s| s.terminate())?;
        Ok(())
    }
}

/// Channels opened on one connection, keyed by channel id.
#[derive(Debug)]
pub struct ChannelRegistry {
    conn_uid: u32,
    next_channel_id: u32,
    channels: BTreeMap<u32, MiningChannel>,
}

impl ChannelRegistry {
    pub fn new(conn_uid: u32) -> Self {
        Self {
            conn_uid,
            next_channel_id: 0,
            channels: BTreeMap::new(),
        }
    }

    pub fn conn_uid(&self) -> u32 {
        self.conn_uid
    }

    /// Opens a channel for `session` under a fresh id. Once the counter wraps, ids still held by
    /// open channels are skipped.
    pub fn open(&mut self, session: Arc<Mutex<MiningSession>>) -> &mut MiningChannel {
        let mut id = self.next_channel_id;
        while self.channels.contains_key(&id) {
            id = id.wrapping_add(1);
        }
        self.next_channel_id = id.wrapping_add(1);
        let conn_uid = self.conn_uid;
        self.channels
            .entry(id)
            .or_insert_with(|| MiningChannel::new(id, conn_uid, session))
    }

    /// Registers a channel whose id was assigned by the upstream.
    pub fn insert(&mut self, channel: MiningChannel) -> Option<MiningChannel> {
        self.channels.insert(channel.id(), channel)
    }

    pub fn get_channel(&self, id: u32) -> Option<&MiningChannel> {
        self.channels.get(&id)
    }

    pub fn get_channel_mut(&mut self, id: u32) -> Option<&mut MiningChannel> {
        self.channels.get_mut(&id)
    }

    /// Removes a channel and terminates its session.
    pub fn close(&mut self, id: u32) -> Result<Option<MiningChannel>, ChannelError> {
        match self.channels.remove(&id) {
            Some(mut channel) => {
                channel.terminate()?;
                Ok(Some(channel))
            }
            None => Ok(None),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MiningChannel> {
        self.channels.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MiningChannel> {
        self.channels.values_mut()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn terminate_all(&mut self) -> Result<(), ChannelError> {
        for channel in self.channels.values_mut() {
            channel.terminate()?;
        }
        self.channels.clear();
        Ok(())
    }
}
