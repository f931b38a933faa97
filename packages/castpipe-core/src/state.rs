//! Configuration for a media server instance.
//!
//! [`Config`] is plain data with serde defaults so that frontends can load
//! it from YAML and override individual fields before passing it to
//! [`MediaServer`](crate::server::MediaServer).

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::protocol_constants::{
    DEFAULT_CHUNKED_THRESHOLD, DEFAULT_PORT, DEFAULT_WORKER_THREADS, MAX_CHUNK_SIZE,
};

/// Controls how ranges are delivered.
///
/// Ranges up to `chunked_threshold` bytes are read into memory and sent
/// with a fixed `Content-Length`. Longer ranges use chunked transfer coding
/// and are read from disk in pieces of at most `chunk_size` bytes.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Largest single read from disk in chunked mode (bytes).
    pub chunk_size: usize,

    /// Range length above which chunked mode is used (bytes).
    pub chunked_threshold: u64,
}

impl StreamingConfig {
    /// Creates a new `StreamingConfig` with validated values.
    ///
    /// # Errors
    ///
    /// Returns an error if any value would cause runtime issues.
    pub fn new(chunk_size: usize, chunked_threshold: u64) -> Result<Self, String> {
        let config = Self {
            chunk_size,
            chunked_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be >= 1".to_string());
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(format!("chunk_size must be <= {MAX_CHUNK_SIZE}"));
        }
        Ok(())
    }

    /// Whether a range of `len` bytes should be sent with chunked coding.
    #[must_use]
    pub fn use_chunked(&self, len: u64) -> bool {
        len > self.chunked_threshold
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: MAX_CHUNK_SIZE,
            chunked_threshold: DEFAULT_CHUNKED_THRESHOLD,
        }
    }
}

/// Configuration for one media server instance.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Address to bind the listener to (all interfaces by default).
    pub bind_addr: IpAddr,

    /// TCP port to listen on (0 = ephemeral).
    pub port: u16,

    /// Worker threads for the server's dedicated runtime.
    pub worker_threads: usize,

    /// Address to put in the serving URL instead of the detected one.
    pub advertise_ip: Option<IpAddr>,

    /// Range delivery behaviour.
    pub streaming: StreamingConfig,
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_threads == 0 {
            return Err("worker_threads must be >= 1".to_string());
        }
        self.streaming.validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            worker_threads: DEFAULT_WORKER_THREADS,
            advertise_ip: None,
            streaming: StreamingConfig::default(),
        }
    }
}
