//! castpipe server - serve one media file to a cast receiver.
//!
//! Starts a media server for the given file, prints the URL and content
//! type a receiver should be pointed at, and runs until Ctrl+C or SIGTERM.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use castpipe_core::{ErrorCode, MediaServer};
use clap::Parser;
use tokio::signal;

use crate::config::ServerConfig;

/// castpipe server - headless single-file media server for cast receivers.
#[derive(Parser, Debug)]
#[command(name = "castpipe-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Media file to serve.
    #[arg(value_name = "MEDIA")]
    file: PathBuf,

    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "CASTPIPE_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long, env = "CASTPIPE_PORT")]
    port: Option<u16>,

    /// Advertise IP address (overrides config file).
    #[arg(short = 'a', long, env = "CASTPIPE_ADVERTISE_IP")]
    advertise_ip: Option<std::net::IpAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("castpipe server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    if let Some(ip) = args.advertise_ip {
        config.advertise_ip = Some(ip);
    }

    log::info!(
        "Configuration: bind={}:{}, advertise_ip={}, chunk_size={}, chunked_threshold={}",
        config.bind_addr,
        config.bind_port,
        config
            .advertise_ip
            .map_or_else(|| "auto".to_string(), |ip| ip.to_string()),
        config.chunk_size,
        config.chunked_threshold
    );

    let mut server = MediaServer::with_config(&args.file, config.to_core_config()?);
    if let Err(e) = server.start() {
        let context = format!(
            "Failed to start media server for {} [{}]",
            args.file.display(),
            e.code()
        );
        return Err(anyhow::Error::new(e).context(context));
    }

    let url = match server.serving_url() {
        Ok(url) => url,
        Err(e) => {
            let context = format!(
                "Failed to determine a routable local IP address [{}]. \
                 Please specify --advertise-ip or set CASTPIPE_ADVERTISE_IP.",
                e.code()
            );
            return Err(anyhow::Error::new(e).context(context));
        }
    };
    println!("{url}");
    println!("{}", server.content_type());

    // Wait for shutdown signal
    shutdown_signal().await;

    log::info!("Shutdown signal received, stopping server...");

    // stop() joins the worker thread; keep that off the async executor.
    tokio::task::spawn_blocking(move || server.stop())
        .await
        .context("Server shutdown task failed")?;

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
