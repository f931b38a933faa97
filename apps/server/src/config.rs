//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use castpipe_core::protocol_constants::{
    DEFAULT_CHUNKED_THRESHOLD, DEFAULT_PORT, DEFAULT_WORKER_THREADS, MAX_CHUNK_SIZE,
};
use castpipe_core::StreamingConfig;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: IpAddr,

    /// Port to bind the HTTP server to.
    /// Override: `CASTPIPE_PORT`
    pub bind_port: u16,

    /// IP address to put in the serving URL.
    /// If not specified, the outbound-routable address is detected.
    /// Override: `CASTPIPE_ADVERTISE_IP`
    pub advertise_ip: Option<IpAddr>,

    /// Worker threads for the media server runtime.
    pub worker_threads: usize,

    /// Largest single disk read in chunked mode (bytes).
    /// Override: `CASTPIPE_CHUNK_SIZE`
    pub chunk_size: usize,

    /// Range length above which responses are chunked (bytes).
    /// Override: `CASTPIPE_CHUNKED_THRESHOLD`
    pub chunked_threshold: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            bind_port: DEFAULT_PORT,
            advertise_ip: None,
            worker_threads: DEFAULT_WORKER_THREADS,
            chunk_size: MAX_CHUNK_SIZE,
            chunked_threshold: DEFAULT_CHUNKED_THRESHOLD,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CASTPIPE_PORT") {
            if let Ok(port) = val.parse() {
                self.bind_port = port;
            }
        }

        if let Ok(val) = std::env::var("CASTPIPE_ADVERTISE_IP") {
            if let Ok(ip) = val.parse() {
                self.advertise_ip = Some(ip);
            }
        }

        if let Ok(val) = std::env::var("CASTPIPE_CHUNK_SIZE") {
            if let Ok(size) = val.parse() {
                self.chunk_size = size;
            }
        }

        if let Ok(val) = std::env::var("CASTPIPE_CHUNKED_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                self.chunked_threshold = threshold;
            }
        }
    }

    /// Converts to castpipe-core's Config type.
    pub fn to_core_config(&self) -> Result<castpipe_core::Config> {
        let streaming = StreamingConfig::new(self.chunk_size, self.chunked_threshold)
            .map_err(anyhow::Error::msg)
            .context("Invalid streaming configuration")?;

        let config = castpipe_core::Config {
            bind_addr: self.bind_addr,
            port: self.bind_port,
            worker_threads: self.worker_threads,
            advertise_ip: self.advertise_ip,
            streaming,
        };
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }
}
