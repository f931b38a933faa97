//! castpipe core - serves one local media file to cast receivers.
//!
//! A cast receiver (Chromecast-style player) is handed a URL and pulls the
//! media itself, seeking with HTTP `Range` requests while the user scrubs.
//! This crate provides the HTTP side of that exchange: a single-file server
//! that answers every request with `206 Partial Content`, streaming long
//! ranges with chunked transfer coding so multi-gigabyte files never have
//! to sit in memory.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`media`]: The served file, `Range` parsing, content type resolution,
//!   and the range reader
//! - [`api`]: Listener setup and the HTTP handler
//! - [`server`]: [`MediaServer`] lifecycle (start/stop on a dedicated thread)
//! - [`context`]: Local IP detection and serving URL construction
//! - [`state`]: Configuration
//! - [`error`]: Centralized error types
//!
//! # Example
//!
//! ```no_run
//! use castpipe_core::MediaServer;
//!
//! let mut server = MediaServer::new("/media/movie.mkv", 8000);
//! server.start()?;
//! println!("{} ({})", server.serving_url()?, server.content_type());
//! server.stop();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod context;
pub mod error;
pub mod media;
pub mod protocol_constants;
pub mod server;
pub mod state;

// Re-export commonly used types at the crate root
pub use api::{serve, MediaHandler, ServerError};
pub use context::{
    FixedIpDetector, InterfaceIpDetector, IpDetector, LocalIpDetector, NetworkError,
    RouteIpDetector, UrlBuilder,
};
pub use error::{ErrorCode, MediaError, MediaResult};
pub use media::{resolve_content_type, ByteRange, RangeReader, ServedFile};
pub use server::MediaServer;
pub use state::{Config, StreamingConfig};
