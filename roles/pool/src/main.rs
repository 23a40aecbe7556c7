mod args;

use args::process_cli_args;
use pool_sv2::PoolSv2;
use std::{fs::OpenOptions, io, path::Path, str::FromStr, sync::Mutex};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Logs to stdout and, if `log_file` is set, to that file too. The level comes from `RUST_LOG`
/// and defaults to info.
fn init_logging(log_file: Option<&Path>) -> Result<(), String> {
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
    let config = match process_cli_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    if let Err(e) = init_logging(config.log_file().map(|p| p.as_path())) {
        eprintln!("{}", e);
        return;
    }

    info!("Pool INITIALIZING, listening on {}", config.listen_address());
    if let Err(e) = PoolSv2::new(config).run().await {
        error!("Pool failed to start: {}", e);
    }
}
