use crate::{
    error::{DeviceError, DeviceResult},
    miner::{Miner, Work},
    DeviceConfig,
};
use async_channel::Sender;
use channels_sv2::{utils::Mutex, MiningChannel, MiningJob, MiningSession, VardiffConfig};
use common_messages_sv2::{Protocol, SetupConnection, SetupConnectionError, SetupConnectionSuccess};
use framing_sv2::Sv2Frame;
use handlers_sv2::{
    HandleCommonMessagesFromUpstream, HandleMiningMessagesFromUpstream, SendTo,
    SupportedChannelTypes,
};
use mining_sv2::{
    CloseChannel, NewMiningJob, OpenMiningChannelError, OpenStandardMiningChannel,
    OpenStandardMiningChannelSuccess, Reconnect, SetNewPrevHash, SetTarget, SubmitSharesError,
    SubmitSharesSuccess, Target,
};
use parsers_sv2::AnyMessage;
use std::{
    net::SocketAddr,
    sync::{atomic::AtomicU32, Arc},
    time::Duration,
};
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

const VENDOR: &str = "stratum-mining";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// SetupConnection sent, waiting for the answer
    Init,
    ConnectionSetup,
    ChannelOpen,
}

/// What the pool said about the shares of this device.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStats {
    pub accepted_submits: u64,
    pub accepted_shares: u64,
    pub rejected_submits: u64,
    pub refused_channels: u64,
}

#[derive(Debug)]
pub struct Device {
    conn_uid: u32,
    device_id: String,
    min_share_interval: Duration,
    state: DeviceState,
    channel: Option<MiningChannel>,
    sender: Sender<Sv2Frame>,
    miner: Miner,
    work: Option<Work>,
    mining_task: Option<AbortHandle>,
    sequence_numbers: Arc<AtomicU32>,
    stats: DeviceStats,
    shutdown: Option<DeviceError>,
}

impl Device {
    pub fn new(conn_uid: u32, config: &DeviceConfig, sender: Sender<Sv2Frame>) -> Self {
        Self {
            conn_uid,
            device_id: config.device_id.clone(),
            min_share_interval: config.min_share_interval,
            state: DeviceState::Init,
            channel: None,
            sender,
            miner: Miner::new(config.speed_ghps, config.randomize),
            work: None,
            mining_task: None,
            sequence_numbers: Arc::new(AtomicU32::new(0)),
            stats: DeviceStats::default(),
            shutdown: None,
        }
    }

    /// First message of the connection, `address` is the pool endpoint.
    pub fn setup_connection(&self, address: SocketAddr) -> DeviceResult<AnyMessage> {
        Ok(SetupConnection {
            protocol: Protocol::MiningProtocol,
            min_version: 2,
            max_version: 2,
            flags: 0,
            endpoint_host: address.ip().to_string().try_into()?,
            endpoint_port: address.port(),
            vendor: VENDOR.try_into()?,
            hardware_version: "".try_into()?,
            firmware: "".try_into()?,
            device_id: self.device_id.as_str().try_into()?,
        }
        .into())
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    pub fn channel(&self) -> Option<&MiningChannel> {
        self.channel.as_ref()
    }

    /// Job currently mined, if any
    pub fn work(&self) -> Option<Work> {
        self.work
    }

    /// Error that ends the connection although its message was handled fine, such as a refused
    /// setup or a reconnection request.
    pub fn take_shutdown(&mut self) -> Option<DeviceError> {
        self.shutdown.take()
    }

    fn session(&self, channel_id: u32) -> DeviceResult<Arc<Mutex<MiningSession>>> {
        match &self.channel {
            Some(channel) if channel.id() == channel_id => Ok(channel.session().clone()),
            Some(channel) => Err(DeviceError::ProtocolViolation(format!(
                "message for channel {}, the open channel is {}",
                channel_id,
                channel.id()
            ))),
            None => Err(DeviceError::ProtocolViolation(format!(
                "message for channel {} before any channel was opened",
                channel_id
            ))),
        }
    }

    fn start_mining(&mut self, channel_id: u32, job: &MiningJob) {
        self.stop_mining();
        let work = Work {
            channel_id,
            job_id: job.uid,
            version: job.version,
            difficulty: job.difficulty(),
        };
        let task = tokio::spawn(self.miner.mine(
            work,
            self.sender.clone(),
            self.sequence_numbers.clone(),
        ));
        self.work = Some(work);
        self.mining_task = Some(task.abort_handle());
    }

    fn stop_mining(&mut self) {
        if let Some(task) = self.mining_task.take() {
            task.abort();
        }
        self.work = None;
    }

    /// Stops mining and the session of the open channel.
    pub fn terminate(&mut self) -> DeviceResult<()> {
        self.stop_mining();
        if let Some(mut channel) = self.channel.take() {
            channel.terminate()?;
        }
        Ok(())
    }

    fn speed_report(&self) -> DeviceResult<String> {
        let speed = match &self.channel {
            Some(channel) => channel.session().safe_lock(|s| s.speed())?,
            None => None,
        };
        let speed = match speed {
            Some(speed) => format!("{:.2} Gh/s", speed),
            None => "N/A Gh/s".to_string(),
        };
        Ok(format!(
            "Connection {}: accepted SPEED: {}, accepted submits: {}, rejected submits: {}",
            self.conn_uid, speed, self.stats.accepted_submits, self.stats.rejected_submits
        ))
    }

    /// Logs the accepted speed of the device once per `period`.
    pub async fn report_speed(self_: Arc<Mutex<Self>>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            match self_.safe_lock(|d| d.speed_report()) {
                Ok(Ok(report)) => info!("{}", report),
                Ok(Err(e)) => warn!("Speed not measured: {}", e),
                Err(e) => {
                    error!("Speed report stopped: {}", e);
                    break;
                }
            }
        }
    }
}

impl HandleCommonMessagesFromUpstream for Device {
    type Error = DeviceError;

    fn handle_setup_connection_success(
        &mut self,
        msg: SetupConnectionSuccess,
    ) -> Result<SendTo, DeviceError> {
        if self.state != DeviceState::Init {
            return Err(DeviceError::ProtocolViolation(
                "SetupConnectionSuccess on a connection already set up".to_string(),
            ));
        }
        info!(
            "Connection {}: setup done, protocol version {}",
            self.conn_uid, msg.used_version
        );
        self.state = DeviceState::ConnectionSetup;
        Ok(SendTo::Respond(
            OpenStandardMiningChannel {
                // set by the request registry when sent
                request_id: 0,
                user_identity: self.device_id.as_str().try_into()?,
                nominal_hash_rate: (self.miner.speed_ghps() * 1e9) as f32,
                max_target: self.miner.max_target(self.min_share_interval).into(),
            }
            .into(),
        ))
    }

    fn handle_setup_connection_error(
        &mut self,
        msg: SetupConnectionError,
    ) -> Result<SendTo, DeviceError> {
        error!(
            "Connection {}: setup refused: {}",
            self.conn_uid, msg.error_code
        );
        self.shutdown = Some(DeviceError::SetupRefused(msg.error_code.to_string()));
        Ok(SendTo::None(None))
    }
}

impl HandleMiningMessagesFromUpstream for Device {
    type Error = DeviceError;

    fn get_channel_type_for_upstream(&self) -> SupportedChannelTypes {
        SupportedChannelTypes::Standard
    }

    fn is_work_selection_enabled_for_upstream(&self) -> bool {
        false
    }

    fn handle_open_standard_mining_channel_success(
        &mut self,
        msg: OpenStandardMiningChannelSuccess,
    ) -> Result<SendTo, DeviceError> {
        if let Some(channel) = &self.channel {
            return Err(DeviceError::ProtocolViolation(format!(
                "channel {} opened while channel {} is open",
                msg.channel_id,
                channel.id()
            )));
        }
        let target = Target::from(msg.target);
        info!(
            "Connection {}: channel {} opened at difficulty {}",
            self.conn_uid,
            msg.channel_id,
            target.to_difficulty()
        );
        let session = Arc::new(Mutex::new(MiningSession::new(
            self.device_id.clone(),
            target,
            VardiffConfig::disabled(),
        )));
        MiningSession::run(session.clone(), |_| ())?;
        self.channel = Some(MiningChannel::new(msg.channel_id, self.conn_uid, session));
        self.state = DeviceState::ChannelOpen;
        Ok(SendTo::None(None))
    }

    fn handle_open_mining_channel_error(
        &mut self,
        msg: OpenMiningChannelError,
    ) -> Result<SendTo, DeviceError> {
        error!(
            "Connection {}: channel refused: {}",
            self.conn_uid, msg.error_code
        );
        self.stats.refused_channels += 1;
        Ok(SendTo::None(None))
    }

    fn handle_new_mining_job(&mut self, msg: NewMiningJob) -> Result<SendTo, DeviceError> {
        let session = self.session(msg.channel_id)?;
        let future = msg.is_future();
        let (channel_id, job_id) = (msg.channel_id, msg.job_id);
        let job = session
            .safe_lock(|s| s.new_mining_job(msg.version, msg.merkle_root, Some(job_id)))?
            .ok_or_else(|| {
                DeviceError::ProtocolViolation(format!("job {} announced twice", job_id))
            })?;
        debug!(
            "Connection {}: job {} on channel {}, future: {}",
            self.conn_uid, job_id, channel_id, future
        );
        if !future {
            self.start_mining(channel_id, &job);
        }
        Ok(SendTo::None(None))
    }

    fn handle_set_new_prev_hash(&mut self, msg: SetNewPrevHash) -> Result<SendTo, DeviceError> {
        let session = self.session(msg.channel_id)?;
        // only the job of the new block stays, shares of older ones can not be accepted anymore
        let job = session.safe_lock(|s| {
            let registry = s.job_registry_mut();
            match registry.get_job(msg.job_id).cloned() {
                Some(job) => {
                    registry.retire_all_jobs();
                    registry.drop_retired_jobs();
                    registry.add_job(job.clone()).map(|_| Some(job))
                }
                None => Ok(None),
            }
        })??;
        match job {
            Some(job) => {
                debug!(
                    "Connection {}: new block, mining job {}",
                    self.conn_uid, job.uid
                );
                self.start_mining(msg.channel_id, &job);
                Ok(SendTo::None(None))
            }
            None => Err(DeviceError::ProtocolViolation(format!(
                "new block for unknown job {}",
                msg.job_id
            ))),
        }
    }

    fn handle_set_target(&mut self, msg: SetTarget) -> Result<SendTo, DeviceError> {
        let session = self.session(msg.channel_id)?;
        let target = Target::from(msg.maximum_target);
        session.safe_lock(|s| s.set_target(target))?;
        info!(
            "Connection {}: channel {} difficulty set to {}",
            self.conn_uid,
            msg.channel_id,
            target.to_difficulty()
        );
        Ok(SendTo::None(None))
    }

    fn handle_submit_shares_success(
        &mut self,
        msg: SubmitSharesSuccess,
    ) -> Result<SendTo, DeviceError> {
        let session = self.session(msg.channel_id)?;
        session.safe_lock(|s| s.account_diff_shares(msg.new_shares_sum as u64))??;
        self.stats.accepted_submits += msg.new_submits_accepted_count as u64;
        self.stats.accepted_shares += msg.new_shares_sum as u64;
        debug!(
            "Connection {}: shares accepted up to {}",
            self.conn_uid, msg.last_sequence_number
        );
        Ok(SendTo::None(None))
    }

    fn handle_submit_shares_error(
        &mut self,
        msg: SubmitSharesError,
    ) -> Result<SendTo, DeviceError> {
        warn!(
            "Connection {}: share {} rejected: {}",
            self.conn_uid, msg.sequence_number, msg.error_code
        );
        self.stats.rejected_submits += 1;
        Ok(SendTo::None(None))
    }

    fn handle_close_channel(&mut self, msg: CloseChannel) -> Result<SendTo, DeviceError> {
        self.session(msg.channel_id)?;
        info!(
            "Connection {}: channel {} closed by the pool: {}",
            self.conn_uid, msg.channel_id, msg.reason_code
        );
        self.terminate()?;
        self.state = DeviceState::ConnectionSetup;
        Ok(SendTo::None(None))
    }

    fn handle_reconnect(&mut self, msg: Reconnect) -> Result<SendTo, DeviceError> {
        info!(
            "Connection {}: pool asked to reconnect to {}:{}",
            self.conn_uid, msg.new_host, msg.new_port
        );
        self.shutdown = Some(DeviceError::ReconnectRequested(
            msg.new_host.to_string(),
            msg.new_port,
        ));
        Ok(SendTo::None(None))
    }
}
