pub mod message_handler;

use super::{
    error::{PoolError, PoolResult},
    mining_pool::{stats::PrevHash, PoolContext, TargetUpdate},
    status,
};
use async_channel::Sender;
use binary_sv2::U256;
use channels_sv2::{utils::Mutex, ChannelRegistry, MiningJob, MiningSession};
use error_handling::handle_result;
use framing_sv2::Sv2Frame;
use handlers_sv2::HandleMessagesFromDownstream;
use mining_sv2::{NewMiningJob, SetNewPrevHash, SetTarget, Target};
use network_helpers_sv2::ConnectionProcessor;
use parsers_sv2::{AnyMessage, IsSv2Message};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Version field of every job handed out by the pool.
pub const JOB_VERSION: u32 = 0x2000_0000;

/// A mining device connected to the pool, with the channels it opened.
///
/// Everything sent to the device is enqueued on `sender` while the downstream is locked, so the
/// device sees the messages of concurrent events (its own requests, new blocks, vardiff) in the
/// order they were applied to the channel state.
#[derive(Debug)]
pub struct Downstream {
    conn_uid: u32,
    setup_done: bool,
    channels: ChannelRegistry,
    context: PoolContext,
    sender: Sender<Sv2Frame>,
}

impl Downstream {
    pub fn new(conn_uid: u32, sender: Sender<Sv2Frame>, context: PoolContext) -> Self {
        Self {
            conn_uid,
            setup_done: false,
            channels: ChannelRegistry::new(conn_uid),
            context,
            sender,
        }
    }

    pub fn conn_uid(&self) -> u32 {
        self.conn_uid
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Serves the connection until it fails or the peer goes away.
    pub async fn run(
        self_: Arc<Mutex<Self>>,
        mut processor: ConnectionProcessor,
        status_tx: status::Sender,
    ) {
        let conn_uid = processor.uid();
        debug!("Connection {}: starting up downstream receiver", conn_uid);
        loop {
            let message = handle_result!(status_tx, processor.receive().await);
            handle_result!(status_tx, Self::handle(&self_, message));
        }
        processor.close();
        warn!("Connection {}: downstream connection dropped", conn_uid);
    }

    fn handle(self_: &Arc<Mutex<Self>>, message: AnyMessage) -> PoolResult<()> {
        self_.safe_lock(|d| {
            let send_to = d.handle_message_from_downstream(message)?;
            d.send_messages(send_to.into_messages())
        })?
    }

    /// Enqueues `messages` for the device, in order.
    pub fn send_messages(&self, messages: Vec<AnyMessage>) -> PoolResult<()> {
        for message in messages {
            debug!(
                "Connection {}: sending message 0x{:02x}",
                self.conn_uid,
                message.message_type()
            );
            let frame = message.to_frame()?;
            self.sender.try_send(frame)?;
        }
        Ok(())
    }

    /// New block: every channel starts mining its future job on `prev_hash`, the jobs of the
    /// previous block become stale.
    pub fn activate_future_jobs(&mut self, prev_hash: &PrevHash) -> PoolResult<()> {
        let mut messages = Vec::with_capacity(self.channels.len());
        for channel in self.channels.iter_mut() {
            if !channel.has_future_job() {
                warn!(
                    "Connection {}: channel {} has no future job for the new block",
                    self.conn_uid,
                    channel.id()
                );
                continue;
            }
            let job = channel.take_future_job()?;
            messages.push(set_new_prev_hash(channel.id(), job.uid, prev_hash));
            channel.session().safe_lock(|s| {
                let registry = s.job_registry_mut();
                registry.retire_all_jobs();
                registry.add_job(job)
            })??;
        }
        self.send_messages(messages)
    }

    /// Hands every channel the future job of the next block.
    pub fn new_future_jobs(&mut self) -> PoolResult<()> {
        let mut messages = Vec::with_capacity(self.channels.len());
        for channel in self.channels.iter_mut() {
            // opened after the new block was announced
            if channel.has_future_job() {
                continue;
            }
            let job = new_job(channel.session())?;
            messages.push(new_mining_job(channel.id(), &job, true));
            channel.add_future_job(job)?;
        }
        self.send_messages(messages)
    }

    /// The vardiff loop of `channel_id` moved its session to `target`: announce it together with
    /// a job that can be mined right away.
    pub fn on_vardiff_change(&mut self, channel_id: u32, target: Target) -> PoolResult<()> {
        let channel = match self.channels.get_channel(channel_id) {
            Some(channel) => channel,
            None => {
                debug!(
                    "Connection {}: channel {} closed before its target update",
                    self.conn_uid, channel_id
                );
                return Ok(());
            }
        };
        let job = new_job(channel.session())?;
        info!(
            "Connection {}: channel {} difficulty is now {}",
            self.conn_uid,
            channel_id,
            target.to_difficulty()
        );
        self.send_messages(vec![
            SetTarget {
                channel_id,
                maximum_target: target.into(),
            }
            .into(),
            new_mining_job(channel_id, &job, false),
        ])
    }

    /// Stops every session of the connection and closes the outgoing queue.
    pub fn terminate(&mut self) -> PoolResult<()> {
        self.channels.terminate_all()?;
        self.sender.close();
        Ok(())
    }

    fn target_update_callback(&self, channel_id: u32) -> impl FnMut(Target) + Send + 'static {
        let conn_uid = self.conn_uid;
        let updates = self.context.vardiff_tx.clone();
        move |target| {
            let update = TargetUpdate {
                conn_uid,
                channel_id,
                target,
            };
            if updates.try_send(update).is_err() {
                debug!(
                    "Connection {}: target update of channel {} dropped",
                    conn_uid, channel_id
                );
            }
        }
    }
}

/// Next job of a session, at the session target, with a random merkle root.
fn new_job(session: &Arc<Mutex<MiningSession>>) -> PoolResult<MiningJob> {
    let merkle_root: [u8; 32] = rand::thread_rng().gen();
    session
        .safe_lock(|s| s.new_mining_job(JOB_VERSION, U256::from(merkle_root), None))?
        .ok_or_else(|| PoolError::Custom("job id already in use".to_string()))
}

fn new_mining_job(channel_id: u32, job: &MiningJob, future_job: bool) -> AnyMessage {
    NewMiningJob {
        channel_id,
        job_id: job.uid,
        future_job,
        version: job.version,
        merkle_root: job.merkle_root,
    }
    .into()
}

fn set_new_prev_hash(channel_id: u32, job_id: u32, prev_hash: &PrevHash) -> AnyMessage {
    SetNewPrevHash {
        channel_id,
        job_id,
        prev_hash: prev_hash.prev_hash,
        min_ntime: prev_hash.min_ntime,
        nbits: prev_hash.nbits,
    }
    .into()
}
