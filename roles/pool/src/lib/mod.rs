//! # Pool
//!
//! Sv2 pool role: mining devices connect over the noise transport, open standard channels and
//! submit shares. Jobs and block changes are simulated, every channel gets its difficulty from
//! its own vardiff loop.
pub mod config;
pub mod downstream;
pub mod error;
pub mod mining_pool;
pub mod status;

use async_channel::{unbounded, Receiver};
use channels_sv2::utils::Mutex;
use config::PoolConfig;
use error::PoolResult;
use mining_pool::Pool;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct PoolSv2 {
    config: PoolConfig,
}

impl PoolSv2 {
    pub fn new(config: PoolConfig) -> PoolSv2 {
        PoolSv2 { config }
    }

    /// Starts the pool and returns once it is listening. The status loop keeps running in the
    /// background.
    pub async fn start(&self) -> PoolResult<Arc<Mutex<Pool>>> {
        let (pool, status_rx) = self.launch().await?;
        tokio::spawn(Self::status_loop(pool.clone(), status_rx));
        Ok(pool)
    }

    /// Starts the pool and runs until it is interrupted or a component shuts down.
    pub async fn run(&self) -> PoolResult<()> {
        let (pool, status_rx) = self.launch().await?;
        Self::status_loop(pool, status_rx).await;
        Ok(())
    }

    async fn launch(&self) -> PoolResult<(Arc<Mutex<Pool>>, Receiver<status::Status>)> {
        let (status_tx, status_rx) = unbounded();
        let pool = Pool::start(
            self.config.clone(),
            status::Sender::DownstreamListener(status_tx),
        )
        .await?;
        Ok((pool, status_rx))
    }

    // See `./status.rs` and `utils/error_handling` for information on how this operates
    async fn status_loop(pool: Arc<Mutex<Pool>>, status_rx: Receiver<status::Status>) {
        loop {
            let task_status = select! {
                task_status = status_rx.recv() => task_status,
                interrupt_signal = tokio::signal::ctrl_c() => {
                    match interrupt_signal {
                        Ok(()) => {
                            info!("Interrupt received");
                        },
                        Err(err) => {
                            error!("Unable to listen for interrupt signal: {}", err);
                            // we also shut down in case of error
                        },
                    }
                    break;
                }
            };
            let task_status: status::Status = match task_status {
                Ok(status) => status,
                Err(_) => break,
            };

            match task_status.state {
                // Should only be sent by the downstream listener
                status::State::DownstreamShutdown(err) => {
                    error!(
                        "SHUTDOWN from Downstream: {}\nTry to restart the downstream listener",
                        err
                    );
                    break;
                }
                status::State::BlockGeneratorShutdown(err) => {
                    error!("SHUTDOWN from block generator: {}", err);
                    break;
                }
                status::State::Healthy(msg) => {
                    info!("HEALTHY message: {}", msg);
                }
                status::State::DownstreamInstanceDropped(downstream_id) => {
                    warn!("Dropping downstream instance {} from pool", downstream_id);
                    match pool.safe_lock(|p| p.remove_downstream(downstream_id)) {
                        Ok(Ok(())) => (),
                        Ok(Err(e)) => warn!("Downstream {} not released: {}", downstream_id, e),
                        Err(_) => break,
                    }
                }
            }
        }
        match pool.safe_lock(|p| p.shutdown()) {
            Ok(Ok(())) => info!("Pool shut down"),
            Ok(Err(e)) => error!("Pool shut down with error: {}", e),
            Err(e) => error!("Pool shut down with poisoned lock: {}", e),
        }
    }
}
