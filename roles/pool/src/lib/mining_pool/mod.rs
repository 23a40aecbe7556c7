pub mod stats;

use super::{
    config::PoolConfig,
    downstream::Downstream,
    error::{PoolError, PoolResult},
    status,
};
use async_channel::{unbounded, Receiver, Sender};
use channels_sv2::{utils::Mutex, VardiffConfig};
use error_handling::handle_result;
use mining_sv2::Target;
use network_helpers_sv2::ConnectionProcessor;
use noise_sv2::{HandshakeRole, Responder};
use nohash_hasher::BuildNoHashHasher;
use stats::{PrevHash, ShareStats};
use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, task, task::AbortHandle};
use tracing::{debug, error, info, warn};

/// New target chosen by the vardiff loop of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetUpdate {
    pub conn_uid: u32,
    pub channel_id: u32,
    pub target: Target,
}

/// State shared by the pool with every downstream.
#[derive(Debug, Clone)]
pub struct PoolContext {
    pub default_target: Target,
    pub vardiff: VardiffConfig,
    pub stats: Arc<Mutex<ShareStats>>,
    pub prev_hash: Arc<Mutex<PrevHash>>,
    pub vardiff_tx: Sender<TargetUpdate>,
}

#[derive(Debug)]
pub struct Pool {
    downstreams: HashMap<u32, Arc<Mutex<Downstream>>, BuildNoHashHasher<u32>>,
    context: PoolContext,
    local_addr: SocketAddr,
    tasks: Vec<AbortHandle>,
}

impl Pool {
    /// Binds the listener and spawns the tasks of the pool: the downstream listener, the vardiff
    /// updates, the block generator and the speed report.
    pub async fn start(config: PoolConfig, status_tx: status::Sender) -> PoolResult<Arc<Mutex<Self>>> {
        config.check_authority_keypair()?;
        let listener = TcpListener::bind(config.listen_address()).await?;
        let local_addr = listener.local_addr()?;
        info!("Listening for downstream connections on {}", local_addr);

        let (vardiff_tx, vardiff_rx) = unbounded();
        let context = PoolContext {
            default_target: config.default_target(),
            vardiff: VardiffConfig {
                enabled: config.enable_vardiff(),
                desired_submits_per_sec: config.desired_submits_per_sec(),
                window: config.meter_period(),
            },
            stats: Arc::new(Mutex::new(ShareStats::new(config.meter_period()))),
            prev_hash: Arc::new(Mutex::new(PrevHash::random())),
            vardiff_tx,
        };
        let stats = context.stats.clone();
        let pool = Arc::new(Mutex::new(Pool {
            downstreams: HashMap::with_hasher(BuildNoHashHasher::default()),
            context,
            local_addr,
            tasks: vec![],
        }));

        let block_interval = config.block_interval();
        let meter_period = config.meter_period();
        let mut tasks = vec![
            task::spawn(Self::accept_downstreams(
                pool.clone(),
                listener,
                config,
                status_tx.clone(),
            ))
            .abort_handle(),
            task::spawn(Self::apply_target_updates(pool.clone(), vardiff_rx)).abort_handle(),
            task::spawn(Self::report_speed(stats, meter_period)).abort_handle(),
        ];
        if block_interval.is_zero() {
            info!("Block generator disabled");
        } else {
            tasks.push(
                task::spawn(Self::generate_blocks(
                    pool.clone(),
                    block_interval,
                    status_tx.to_block_generator(),
                ))
                .abort_handle(),
            );
        }
        pool.safe_lock(|p| p.tasks = tasks)?;
        Ok(pool)
    }

    async fn accept_downstreams(
        self_: Arc<Mutex<Self>>,
        listener: TcpListener,
        config: PoolConfig,
        status_tx: status::Sender,
    ) {
        loop {
            let (stream, address) = handle_result!(status_tx, listener.accept().await);
            let responder = handle_result!(
                status_tx,
                Responder::new(
                    config.authority_secret_key().clone(),
                    config.cert_validity()
                )
            );
            let pool = self_.clone();
            let status_tx = status_tx.clone();
            task::spawn(async move {
                let mut processor = ConnectionProcessor::new();
                let conn_uid = processor.uid();
                info!("Connection {}: accepted from {}", conn_uid, address);
                let role = HandshakeRole::Responder(Box::new(responder));
                if let Err(e) = processor.connect(stream, role).await {
                    warn!("Connection {}: handshake with {} failed: {}", conn_uid, address, e);
                    return;
                }
                match Self::add_downstream(&pool, &processor) {
                    Ok(downstream) => {
                        let status_tx = status_tx.listener_to_connection(conn_uid);
                        Downstream::run(downstream, processor, status_tx).await
                    }
                    Err(e) => error!("Connection {}: not registered: {}", conn_uid, e),
                }
            });
        }
    }

    fn add_downstream(
        self_: &Arc<Mutex<Self>>,
        processor: &ConnectionProcessor,
    ) -> PoolResult<Arc<Mutex<Downstream>>> {
        let sender = processor.sender()?;
        let conn_uid = processor.uid();
        let downstream = self_.safe_lock(|p| {
            let downstream = Arc::new(Mutex::new(Downstream::new(
                conn_uid,
                sender,
                p.context.clone(),
            )));
            p.downstreams.insert(conn_uid, downstream.clone());
            downstream
        })?;
        Ok(downstream)
    }

    async fn apply_target_updates(self_: Arc<Mutex<Self>>, updates: Receiver<TargetUpdate>) {
        while let Ok(update) = updates.recv().await {
            let downstream = match self_.safe_lock(|p| p.downstreams.get(&update.conn_uid).cloned())
            {
                Ok(Some(downstream)) => downstream,
                Ok(None) => {
                    debug!(
                        "Connection {}: gone, target update dropped",
                        update.conn_uid
                    );
                    continue;
                }
                Err(e) => {
                    error!("Target updates stopped: {}", e);
                    break;
                }
            };
            let res = downstream
                .safe_lock(|d| d.on_vardiff_change(update.channel_id, update.target))
                .map_err(PoolError::from)
                .and_then(|r| r);
            if let Err(e) = res {
                warn!(
                    "Connection {}: target update not sent: {}",
                    update.conn_uid, e
                );
            }
        }
    }

    async fn generate_blocks(
        self_: Arc<Mutex<Self>>,
        block_interval: Duration,
        status_tx: status::Sender,
    ) {
        let mut interval = tokio::time::interval(block_interval);
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            handle_result!(status_tx, Self::on_new_block(&self_));
        }
    }

    async fn report_speed(stats: Arc<Mutex<ShareStats>>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            match stats.safe_lock(|s| s.report()) {
                Ok(report) => info!("{}", report),
                Err(e) => {
                    error!("Speed report stopped: {}", e);
                    break;
                }
            }
        }
    }

    /// Announces a new block to every downstream: the future job of each channel becomes the
    /// active one on the new tip, then every channel gets the future job of the next block.
    pub fn on_new_block(self_: &Arc<Mutex<Self>>) -> PoolResult<()> {
        let prev_hash = PrevHash::random();
        let (downstreams, shared_prev_hash) = self_.safe_lock(|p| {
            (
                p.downstreams.values().cloned().collect::<Vec<_>>(),
                p.context.prev_hash.clone(),
            )
        })?;
        shared_prev_hash.safe_lock(|p| *p = prev_hash.clone())?;
        info!(
            "New block at {}, notifying {} downstreams",
            prev_hash.min_ntime,
            downstreams.len()
        );

        for downstream in &downstreams {
            let res = downstream
                .safe_lock(|d| d.activate_future_jobs(&prev_hash))
                .map_err(PoolError::from)
                .and_then(|r| r);
            if let Err(e) = res {
                warn!("New block not announced to a downstream: {}", e);
            }
        }
        for downstream in &downstreams {
            let res = downstream
                .safe_lock(|d| d.new_future_jobs())
                .map_err(PoolError::from)
                .and_then(|r| r);
            if let Err(e) = res {
                warn!("Future jobs not sent to a downstream: {}", e);
            }
        }
        Ok(())
    }

    /// Forgets a downstream and terminates the sessions of its channels.
    pub fn remove_downstream(&mut self, conn_uid: u32) -> PoolResult<()> {
        if let Some(downstream) = self.downstreams.remove(&conn_uid) {
            downstream.safe_lock(|d| d.terminate())??;
            info!("Connection {}: removed from pool", conn_uid);
        }
        Ok(())
    }

    /// Stops every task of the pool and releases all downstreams.
    pub fn shutdown(&mut self) -> PoolResult<()> {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        let conn_uids: Vec<u32> = self.downstreams.keys().copied().collect();
        for conn_uid in conn_uids {
            self.remove_downstream(conn_uid)?;
        }
        Ok(())
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> Arc<Mutex<ShareStats>> {
        self.context.stats.clone()
    }

    pub fn downstream_count(&self) -> usize {
        self.downstreams.len()
    }
}
