use clap::Parser;
use mining_device::DeviceConfig;
use noise_sv2::keys::Ed25519PublicKey;
use std::{fs::OpenOptions, io, path::PathBuf, str::FromStr, sync::Mutex, time::Duration};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulated SV2 mining device", long_about = None)]
struct Args {
    #[arg(
        short = 'p',
        long = "pool-address",
        help = "Pool address as host:port",
        default_value = "127.0.0.1:3336"
    )]
    pool_address: String,
    #[arg(
        short = 'k',
        long = "pubkey-pool",
        help = "Authority public key of the pool, base58 encoded",
        default_value = const_sv2::DEFAULT_AUTHORITY_PUBLIC_KEY
    )]
    pubkey_pool: String,
    #[arg(
        short = 'i',
        long = "id-device",
        help = "Device identifier sent in SetupConnection and as user identity",
        default_value = "mining-device"
    )]
    id_device: String,
    #[arg(
        short = 's',
        long = "speed",
        help = "Simulated hashrate in GH/s",
        default_value_t = 1.0
    )]
    speed_ghps: f64,
    #[arg(
        long = "min-share-interval",
        help = "Seconds between shares the device asks the pool for at least",
        default_value_t = 1.0
    )]
    min_share_interval: f64,
    #[arg(
        short = 'r',
        long = "randomize",
        help = "Exponentially distributed time between shares instead of a fixed one"
    )]
    randomize: bool,
    #[arg(
        short = 'f',
        long = "log-file",
        help = "Path to the log file. If not set, logs will only be written to stdout."
    )]
    log_file: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<DeviceConfig, String> {
        let authority_public_key = Ed25519PublicKey::from_str(&self.pubkey_pool)
            .map_err(|e| format!("Invalid pool public key {}: {:?}", self.pubkey_pool, e))?;
        if !self.speed_ghps.is_finite() || self.speed_ghps <= 0.0 {
            return Err(format!("Invalid speed {} GH/s", self.speed_ghps));
        }
        let min_share_interval = Duration::try_from_secs_f64(self.min_share_interval)
            .map_err(|e| format!("Invalid min share interval {}: {}", self.min_share_interval, e))?;
        let mut config = DeviceConfig::new(self.pool_address, authority_public_key);
        config.device_id = self.id_device;
        config.speed_ghps = self.speed_ghps;
        config.min_share_interval = min_share_interval;
        config.randomize = self.randomize;
        Ok(config)
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<(), String> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let log_level_filter = LevelFilter::from_str(&rust_log).unwrap_or(LevelFilter::INFO);
    let env_filter = EnvFilter::new(log_level_filter.to_string());
    let stdout_layer = fmt::layer().with_writer(io::stdout);

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))?;
            let file_layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            Box::new(
                Registry::default()
                    .with(env_filter)
                    .with(stdout_layer)
                    .with(file_layer),
            )
        }
        None => Box::new(Registry::default().with(env_filter).with(stdout_layer)),
    };
    tracing::subscriber::set_global_default(subscriber).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = init_logging(args.log_file.as_ref()) {
        eprintln!("{}", e);
        return;
    }
    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    info!(
        "Device {} mining at {} GH/s on {}",
        config.device_id, config.speed_ghps, config.pool_address
    );
    mining_device::run(config).await
}
