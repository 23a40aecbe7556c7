//! # Mining device
//!
//! Simulated Sv2 mining device. It connects to a pool over the noise transport, opens one
//! standard channel and submits shares at the rate a device of the configured speed would find
//! them. The connection is re-established whenever it is lost.
pub mod device;
pub mod error;
pub mod miner;

use channels_sv2::{utils::Mutex, VardiffConfig};
use device::Device;
use error::{DeviceError, DeviceResult};
use handlers_sv2::HandleMessagesFromUpstream;
use network_helpers_sv2::ConnectionProcessor;
use noise_sv2::{keys::Ed25519PublicKey, HandshakeRole, Initiator};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpStream;
use tracing::{error, info, warn};

/// Longest wait between two connection attempts
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// `host:port` of the pool
    pub pool_address: String,
    /// Key the pool certificate must be signed with
    pub authority_public_key: Ed25519PublicKey,
    pub device_id: String,
    pub speed_ghps: f64,
    /// The device asks for a target that makes it find a share at most this often
    pub min_share_interval: Duration,
    pub randomize: bool,
    pub reconnect_delay: Duration,
}

impl DeviceConfig {
    pub fn new(pool_address: String, authority_public_key: Ed25519PublicKey) -> Self {
        Self {
            pool_address,
            authority_public_key,
            device_id: "mining-device".to_string(),
            speed_ghps: 1.0,
            min_share_interval: Duration::from_secs(1),
            randomize: false,
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

/// Keeps the device connected to its pool. Failed attempts are retried with an exponential
/// back-off, a reconnection asked by the pool is done right away.
pub async fn run(mut config: DeviceConfig) {
    let mut delay = config.reconnect_delay;
    loop {
        match connect(&config).await {
            Err(DeviceError::ReconnectRequested(host, port)) => {
                if !host.is_empty() {
                    config.pool_address = format!("{}:{}", host, port);
                }
                info!("Reconnecting to {}", config.pool_address);
                delay = config.reconnect_delay;
                continue;
            }
            Err(DeviceError::SetupRefused(code)) => {
                error!("Pool refused the device: {}", code);
            }
            Err(e) => {
                warn!("Connection to {} lost: {}", config.pool_address, e);
            }
            Ok(()) => delay = config.reconnect_delay,
        }
        info!("Retrying in {:?}", delay);
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(MAX_RECONNECT_DELAY);
    }
}

/// One connection to the pool: handshake, setup and message loop. Returns when the connection is
/// over.
pub async fn connect(config: &DeviceConfig) -> DeviceResult<()> {
    let address = tokio::net::lookup_host(&config.pool_address)
        .await?
        .next()
        .ok_or_else(|| DeviceError::InvalidAddress(config.pool_address.clone()))?;
    info!("Connecting to pool at {}", address);
    let stream = TcpStream::connect(address).await?;
    let initiator = Initiator::new(config.authority_public_key)?;

    let mut processor = ConnectionProcessor::new();
    let conn_uid = processor.uid();
    processor
        .connect(stream, HandshakeRole::Initiator(Box::new(initiator)))
        .await?;
    info!("Connection {}: noise session established with {}", conn_uid, address);

    let device = Arc::new(Mutex::new(Device::new(conn_uid, config, processor.sender()?)));
    let setup = device.safe_lock(|d| d.setup_connection(address))??;
    processor.send(setup).await?;

    let reporter = tokio::spawn(Device::report_speed(
        device.clone(),
        VardiffConfig::default().window,
    ))
    .abort_handle();
    let result = serve(&device, &mut processor).await;
    reporter.abort();
    processor.close();
    device.safe_lock(|d| d.terminate())??;
    result
}

async fn serve(device: &Arc<Mutex<Device>>, processor: &mut ConnectionProcessor) -> DeviceResult<()> {
    let conn_uid = processor.uid();
    loop {
        let res = processor
            .process_next(|message| {
                device
                    .safe_lock(|d| d.handle_message_from_upstream(message))
                    .map_err(DeviceError::from)
                    .and_then(|r| r)
            })
            .await;
        match res {
            Ok(()) => (),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => warn!("Connection {}: {}", conn_uid, e),
        }
        if let Some(e) = device.safe_lock(|d| d.take_shutdown())? {
            return Err(e);
        }
    }
}
