use super::{new_job, new_mining_job, set_new_prev_hash, Downstream};
use crate::error::PoolError;
use binary_sv2::B032;
use channels_sv2::{utils::Mutex, MiningSession};
use common_messages_sv2::{Protocol, SetupConnection, SetupConnectionError, SetupConnectionSuccess};
use handlers_sv2::{
    HandleCommonMessagesFromDownstream, HandleMiningMessagesFromDownstream, SendTo,
    SupportedChannelTypes,
};
use mining_sv2::{
    CloseChannel, OpenMiningChannelError, OpenStandardMiningChannel,
    OpenStandardMiningChannelSuccess, SubmitSharesError, SubmitSharesStandard,
    SubmitSharesSuccess, Target,
};
use parsers_sv2::AnyMessage;
use std::sync::Arc;
use tracing::{debug, info};

impl HandleCommonMessagesFromDownstream for Downstream {
    type Error = PoolError;

    fn handle_setup_connection(&mut self, msg: SetupConnection) -> Result<SendTo, PoolError> {
        info!(
            "Connection {}: SetupConnection from {} {} (versions {}..={})",
            self.conn_uid, msg.vendor, msg.device_id, msg.min_version, msg.max_version
        );
        if msg.protocol != Protocol::MiningProtocol {
            return Ok(SendTo::Respond(
                SetupConnectionError {
                    flags: 0,
                    error_code: "unsupported-protocol".try_into().unwrap_or_default(),
                }
                .into(),
            ));
        }
        self.setup_done = true;
        Ok(SendTo::Respond(
            SetupConnectionSuccess {
                used_version: msg.used_version(),
                flags: 0,
            }
            .into(),
        ))
    }
}

impl HandleMiningMessagesFromDownstream for Downstream {
    type Error = PoolError;

    fn get_channel_type_for_downstream(&self) -> SupportedChannelTypes {
        SupportedChannelTypes::Standard
    }

    fn is_work_selection_enabled_for_downstream(&self) -> bool {
        false
    }

    fn handle_open_standard_mining_channel(
        &mut self,
        msg: OpenStandardMiningChannel,
    ) -> Result<SendTo, PoolError> {
        if !self.setup_done {
            return Err(PoolError::ProtocolViolation(
                "OpenStandardMiningChannel before SetupConnection".to_string(),
            ));
        }
        let default_target = self.context.default_target;
        if Target::from(msg.max_target) > default_target {
            info!(
                "Connection {}: refusing channel for {}, max target out of range",
                self.conn_uid, msg.user_identity
            );
            return Ok(SendTo::Respond(
                OpenMiningChannelError::new_max_target_out_of_range(msg.request_id).into(),
            ));
        }

        let session = Arc::new(Mutex::new(MiningSession::new(
            format!("Connection {} {}", self.conn_uid, msg.user_identity),
            default_target,
            self.context.vardiff.clone(),
        )));
        let first = new_job(&session)?;
        let next = new_job(&session)?;
        let prev_hash = self.context.prev_hash.safe_lock(|p| p.clone())?;
        let channel = self.channels.open(session.clone());
        let channel_id = channel.id();
        channel.add_future_job(next.clone())?;
        info!(
            "Connection {}: opened channel {} for {} at difficulty {}",
            self.conn_uid,
            channel_id,
            msg.user_identity,
            default_target.to_difficulty()
        );

        MiningSession::run(session, self.target_update_callback(channel_id))?;

        let success: AnyMessage = OpenStandardMiningChannelSuccess {
            request_id: msg.request_id,
            channel_id,
            target: default_target.into(),
            extranonce_prefix: B032::default(),
            group_channel_id: 0,
        }
        .into();
        Ok(SendTo::Multiple(vec![
            SendTo::Respond(success),
            SendTo::Respond(new_mining_job(channel_id, &first, true)),
            SendTo::Respond(set_new_prev_hash(channel_id, first.uid, &prev_hash)),
            SendTo::Respond(new_mining_job(channel_id, &next, true)),
        ]))
    }

    fn handle_submit_shares_standard(
        &mut self,
        msg: SubmitSharesStandard,
    ) -> Result<SendTo, PoolError> {
        let session = match self.channels.get_channel(msg.channel_id) {
            Some(channel) => channel.session().clone(),
            None => {
                self.send_messages(vec![SubmitSharesError::new(
                    msg.channel_id,
                    msg.sequence_number,
                    SubmitSharesError::invalid_channel_error_code(),
                )
                .into()])?;
                return Err(PoolError::ProtocolViolation(format!(
                    "share submitted on unknown channel {}",
                    msg.channel_id
                )));
            }
        };

        let (active, retired) = session.safe_lock(|s| {
            let registry = s.job_registry();
            (
                registry.job_target(msg.job_id),
                registry.retired_job_target(msg.job_id),
            )
        })?;
        let reply: AnyMessage = match (active, retired) {
            (Some(target), _) => {
                let difficulty = target.to_difficulty();
                session.safe_lock(|s| s.account_diff_shares(difficulty))??;
                self.context.stats.safe_lock(|s| s.accept(difficulty))?;
                debug!(
                    "Connection {}: channel {} share {} accepted, difficulty {}",
                    self.conn_uid, msg.channel_id, msg.sequence_number, difficulty
                );
                SubmitSharesSuccess {
                    channel_id: msg.channel_id,
                    last_sequence_number: msg.sequence_number,
                    new_submits_accepted_count: 1,
                    new_shares_sum: u32::try_from(difficulty).unwrap_or(u32::MAX),
                }
                .into()
            }
            (None, Some(target)) => {
                self.context
                    .stats
                    .safe_lock(|s| s.stale(target.to_difficulty()))?;
                debug!(
                    "Connection {}: channel {} share {} is stale",
                    self.conn_uid, msg.channel_id, msg.sequence_number
                );
                SubmitSharesError::new(
                    msg.channel_id,
                    msg.sequence_number,
                    SubmitSharesError::stale_share_error_code(),
                )
                .into()
            }
            (None, None) => {
                self.context.stats.safe_lock(|s| s.reject())?;
                debug!(
                    "Connection {}: channel {} share {} for unknown job {}",
                    self.conn_uid, msg.channel_id, msg.sequence_number, msg.job_id
                );
                SubmitSharesError::new(
                    msg.channel_id,
                    msg.sequence_number,
                    SubmitSharesError::invalid_job_id_error_code(),
                )
                .into()
            }
        };
        Ok(SendTo::Respond(reply))
    }

    fn handle_close_channel(&mut self, msg: CloseChannel) -> Result<SendTo, PoolError> {
        match self.channels.close(msg.channel_id)? {
            Some(_) => {
                info!(
                    "Connection {}: channel {} closed by downstream: {}",
                    self.conn_uid, msg.channel_id, msg.reason_code
                );
                Ok(SendTo::None(None))
            }
            None => Err(PoolError::ProtocolViolation(format!(
                "CloseChannel for unknown channel {}",
                msg.channel_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining_pool::{stats::PrevHash, stats::ShareStats, PoolContext, TargetUpdate};
    use async_channel::{unbounded, Receiver};
    use binary_sv2::Str0255;
    use channels_sv2::VardiffConfig;
    use framing_sv2::Sv2Frame;
    use handlers_sv2::HandleMessagesFromDownstream;
    use mining_sv2::{NewMiningJob, SetNewPrevHash};
    use parsers_sv2::Mining;
    use std::time::Duration;

    struct Harness {
        downstream: Downstream,
        frames: Receiver<Sv2Frame>,
        _updates: Receiver<TargetUpdate>,
    }

    fn harness(conn_uid: u32, context: Option<PoolContext>) -> Harness {
        let (vardiff_tx, updates) = unbounded();
        let context = context.unwrap_or_else(|| PoolContext {
            default_target: Target::diff_1_target(),
            vardiff: VardiffConfig::disabled(),
            stats: Arc::new(Mutex::new(ShareStats::new(Duration::from_secs(60)))),
            prev_hash: Arc::new(Mutex::new(PrevHash::random())),
            vardiff_tx,
        });
        let (sender, frames) = unbounded();
        Harness {
            downstream: Downstream::new(conn_uid, sender, context),
            frames,
            _updates: updates,
        }
    }

    impl Harness {
        fn handle(&mut self, message: AnyMessage) -> Result<Vec<AnyMessage>, PoolError> {
            let send_to = self.downstream.handle_message_from_downstream(message)?;
            self.downstream.send_messages(send_to.into_messages())?;
            Ok(self.sent())
        }

        fn sent(&self) -> Vec<AnyMessage> {
            let mut sent = vec![];
            while let Ok(frame) = self.frames.try_recv() {
                sent.push(AnyMessage::from_frame(&frame).unwrap());
            }
            sent
        }

        fn setup(&mut self) {
            self.handle(setup_connection(Protocol::MiningProtocol))
                .unwrap();
        }

        /// Opens a channel and returns its id and its active job.
        fn open(&mut self) -> (u32, u32) {
            let sent = self.handle(open_channel(Target::diff_1_target())).unwrap();
            match (&sent[0], &sent[1]) {
                (
                    AnyMessage::Mining(Mining::OpenStandardMiningChannelSuccess(success)),
                    AnyMessage::Mining(Mining::NewMiningJob(job)),
                ) => (success.channel_id, job.job_id),
                other => panic!("unexpected reply {:?}", other),
            }
        }

        fn stats(&self) -> (u64, u64, u64, u64, u64) {
            self.downstream
                .context
                .stats
                .safe_lock(|s| {
                    (
                        s.accepted_submits(),
                        s.accepted_shares(),
                        s.stale_submits(),
                        s.stale_shares(),
                        s.rejected_submits(),
                    )
                })
                .unwrap()
        }
    }

    fn setup_connection(protocol: Protocol) -> AnyMessage {
        SetupConnection {
            protocol,
            min_version: 2,
            max_version: 2,
            flags: 0,
            endpoint_host: "0.0.0.0".try_into().unwrap(),
            endpoint_port: 3336,
            vendor: "test".try_into().unwrap(),
            hardware_version: Str0255::default(),
            firmware: Str0255::default(),
            device_id: "device".try_into().unwrap(),
        }
        .into()
    }

    fn open_channel(max_target: Target) -> AnyMessage {
        OpenStandardMiningChannel {
            request_id: 0,
            user_identity: "device".try_into().unwrap(),
            nominal_hash_rate: 1e9,
            max_target: max_target.into(),
        }
        .into()
    }

    fn submit(channel_id: u32, sequence_number: u32, job_id: u32) -> AnyMessage {
        SubmitSharesStandard {
            channel_id,
            sequence_number,
            job_id,
            nonce: 0,
            ntime: 0,
            version: 0,
        }
        .into()
    }

    #[test]
    fn setup_connection_replies_with_used_version() {
        let mut h = harness(0, None);
        let sent = h.handle(setup_connection(Protocol::MiningProtocol)).unwrap();
        assert_eq!(
            sent,
            vec![AnyMessage::from(SetupConnectionSuccess {
                used_version: 2,
                flags: 0
            })]
        );
    }

    #[test]
    fn other_protocols_are_refused() {
        let mut h = harness(0, None);
        let sent = h
            .handle(setup_connection(Protocol::TemplateDistributionProtocol))
            .unwrap();
        assert_eq!(
            sent,
            vec![AnyMessage::from(SetupConnectionError {
                flags: 0,
                error_code: "unsupported-protocol".try_into().unwrap(),
            })]
        );
        // no channel without a successful setup
        assert!(matches!(
            h.handle(open_channel(Target::diff_1_target())),
            Err(PoolError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn open_channel_sends_jobs_and_prev_hash() {
        let mut h = harness(3, None);
        h.setup();
        let sent = h.handle(open_channel(Target::diff_1_target())).unwrap();
        assert_eq!(sent.len(), 4);
        let (channel_id, first, next) = match &sent[..] {
            [AnyMessage::Mining(Mining::OpenStandardMiningChannelSuccess(success)), AnyMessage::Mining(Mining::NewMiningJob(first)), AnyMessage::Mining(Mining::SetNewPrevHash(prev_hash)), AnyMessage::Mining(Mining::NewMiningJob(next))] =>
            {
                assert_eq!(Target::from(success.target), Target::diff_1_target());
                assert_eq!(prev_hash.job_id, first.job_id);
                assert_eq!(prev_hash.channel_id, success.channel_id);
                (success.channel_id, first.clone(), next.clone())
            }
            other => panic!("unexpected replies {:?}", other),
        };
        assert!(first.future_job && next.future_job);
        assert_ne!(first.job_id, next.job_id);

        let channel = h.downstream.channels().get_channel(channel_id).unwrap();
        assert_eq!(channel.conn_uid(), 3);
        assert_eq!(channel.future_job().map(|j| j.uid), Some(next.job_id));
        assert!(channel.session().safe_lock(|s| s.is_running()).unwrap());

        // channel ids are unique on the connection
        let (second_channel, _) = h.open();
        assert_ne!(second_channel, channel_id);
    }

    #[test]
    fn incompatible_max_target_is_refused() {
        let mut h = harness(0, None);
        h.setup();
        let sent = h.handle(open_channel(Target::max_value())).unwrap();
        assert_eq!(
            sent,
            vec![AnyMessage::from(
                OpenMiningChannelError::new_max_target_out_of_range(0)
            )]
        );
        assert!(h.downstream.channels().is_empty());
    }

    #[test]
    fn share_on_active_job_is_accepted() {
        let mut h = harness(0, None);
        h.setup();
        let (channel_id, job_id) = h.open();
        let sent = h.handle(submit(channel_id, 5, job_id)).unwrap();
        assert_eq!(
            sent,
            vec![AnyMessage::from(SubmitSharesSuccess {
                channel_id,
                last_sequence_number: 5,
                new_submits_accepted_count: 1,
                new_shares_sum: 1,
            })]
        );
        assert_eq!(h.stats(), (1, 1, 0, 0, 0));
    }

    #[test]
    fn share_on_stopped_session_is_not_counted() {
        let mut h = harness(0, None);
        h.setup();
        let (channel_id, job_id) = h.open();
        h.downstream
            .channels()
            .get_channel(channel_id)
            .unwrap()
            .session()
            .safe_lock(|s| s.terminate())
            .unwrap();
        assert!(h.handle(submit(channel_id, 2, job_id)).is_err());
        assert!(h.sent().is_empty());
        assert_eq!(h.stats(), (0, 0, 0, 0, 0));
    }

    #[test]
    fn share_on_unknown_job_is_rejected() {
        let mut h = harness(0, None);
        h.setup();
        let (channel_id, _) = h.open();
        let sent = h.handle(submit(channel_id, 1, 999)).unwrap();
        assert_eq!(
            sent,
            vec![AnyMessage::from(SubmitSharesError::new(
                channel_id,
                1,
                SubmitSharesError::invalid_job_id_error_code()
            ))]
        );
        assert_eq!(h.stats(), (0, 0, 0, 0, 1));
    }

    #[test]
    fn share_on_unknown_channel_is_a_violation() {
        let mut h = harness(0, None);
        h.setup();
        assert!(matches!(
            h.handle(submit(7, 1, 0)),
            Err(PoolError::ProtocolViolation(_))
        ));
        assert_eq!(
            h.sent(),
            vec![AnyMessage::from(SubmitSharesError::new(
                7,
                1,
                SubmitSharesError::invalid_channel_error_code()
            ))]
        );
        assert_eq!(h.stats(), (0, 0, 0, 0, 0));
    }

    #[test]
    fn new_block_makes_old_jobs_stale() {
        let mut h = harness(0, None);
        h.setup();
        let (first_channel, first_job) = h.open();
        let (second_channel, second_job) = h.open();

        let prev_hash = PrevHash::random();
        h.downstream.activate_future_jobs(&prev_hash).unwrap();
        h.downstream.new_future_jobs().unwrap();
        let sent = h.sent();
        assert_eq!(sent.len(), 4);

        let mut activated = vec![];
        for message in &sent[..2] {
            match message {
                AnyMessage::Mining(Mining::SetNewPrevHash(SetNewPrevHash {
                    channel_id,
                    job_id,
                    prev_hash: hash,
                    ..
                })) => {
                    assert_eq!(*hash, prev_hash.prev_hash);
                    activated.push((*channel_id, *job_id));
                }
                other => panic!("expected SetNewPrevHash, got {:?}", other),
            }
        }
        for message in &sent[2..] {
            assert!(matches!(
                message,
                AnyMessage::Mining(Mining::NewMiningJob(NewMiningJob {
                    future_job: true,
                    ..
                }))
            ));
        }

        for (channel_id, old_job) in [(first_channel, first_job), (second_channel, second_job)] {
            let session = h
                .downstream
                .channels()
                .get_channel(channel_id)
                .unwrap()
                .session()
                .clone();
            let (active, retired) = session
                .safe_lock(|s| {
                    (
                        s.job_registry().active_count(),
                        s.job_registry().contains_retired(old_job),
                    )
                })
                .unwrap();
            assert_eq!(active, 1);
            assert!(retired);

            let sent = h.handle(submit(channel_id, 9, old_job)).unwrap();
            assert_eq!(
                sent,
                vec![AnyMessage::from(SubmitSharesError::new(
                    channel_id,
                    9,
                    SubmitSharesError::stale_share_error_code()
                ))]
            );
            let (_, new_job) = activated
                .iter()
                .find(|(c, _)| *c == channel_id)
                .copied()
                .unwrap();
            let sent = h.handle(submit(channel_id, 10, new_job)).unwrap();
            assert!(matches!(
                sent[0],
                AnyMessage::Mining(Mining::SubmitSharesSuccess(_))
            ));
        }
        assert_eq!(h.stats(), (2, 2, 2, 2, 0));
    }

    #[test]
    fn vardiff_change_sends_target_then_job() {
        let mut h = harness(0, None);
        h.setup();
        let (channel_id, _) = h.open();
        let target = Target::from_difficulty(8);
        h.downstream
            .channels()
            .get_channel(channel_id)
            .unwrap()
            .session()
            .safe_lock(|s| s.set_target(target))
            .unwrap();
        h.downstream.on_vardiff_change(channel_id, target).unwrap();
        let sent = h.sent();
        assert_eq!(
            sent[0],
            AnyMessage::from(mining_sv2::SetTarget {
                channel_id,
                maximum_target: target.into(),
            })
        );
        let job_id = match &sent[1] {
            AnyMessage::Mining(Mining::NewMiningJob(job)) if !job.future_job => job.job_id,
            other => panic!("expected an active job, got {:?}", other),
        };
        let sent = h.handle(submit(channel_id, 0, job_id)).unwrap();
        assert!(matches!(
            &sent[0],
            AnyMessage::Mining(Mining::SubmitSharesSuccess(s)) if s.new_shares_sum == 8
        ));
    }

    #[test]
    fn close_channel_stops_its_session() {
        let mut h = harness(0, None);
        h.setup();
        let (channel_id, _) = h.open();
        let session = h
            .downstream
            .channels()
            .get_channel(channel_id)
            .unwrap()
            .session()
            .clone();
        let close = CloseChannel {
            channel_id,
            reason_code: "bye".try_into().unwrap(),
        };
        assert!(h.handle(close.clone().into()).unwrap().is_empty());
        assert!(!session.safe_lock(|s| s.is_running()).unwrap());
        assert!(matches!(
            h.handle(close.into()),
            Err(PoolError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn messages_for_the_device_are_unexpected() {
        let mut h = harness(0, None);
        let message: AnyMessage = mining_sv2::SetTarget {
            channel_id: 0,
            maximum_target: Target::diff_1_target().into(),
        }
        .into();
        assert!(matches!(
            h.handle(message),
            Err(PoolError::UnexpectedMessage(_))
        ));
    }
}
