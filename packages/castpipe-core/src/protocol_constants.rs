//! Fixed protocol constants and defaults.
//!
//! Values that mirror HTTP range/chunking behaviour expected by cast
//! receivers, plus the defaults used when no configuration is supplied.

use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Application Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Application name used in logs and the `Server` response header.
pub const APP_NAME: &str = "castpipe";

// ─────────────────────────────────────────────────────────────────────────────
// Networking
// ─────────────────────────────────────────────────────────────────────────────

/// Default TCP port for the media server.
pub const DEFAULT_PORT: u16 = 8000;

/// External address used to discover the outbound-routable local IP.
///
/// A UDP socket is "connected" here only so the OS picks a route; no
/// datagram is ever sent.
pub const ROUTE_PROBE_ADDR: &str = "8.8.8.8:1";

/// Listen backlog for the media server socket.
pub const LISTEN_BACKLOG: i32 = 128;

// ─────────────────────────────────────────────────────────────────────────────
// Range Streaming
// ─────────────────────────────────────────────────────────────────────────────

/// Unit token accepted in the `Range` request header.
pub const RANGE_UNIT: &str = "bytes";

/// Maximum size of a single chunk read from disk in chunked mode (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Ranges longer than this are streamed with chunked transfer coding
/// instead of being buffered as one fixed-length body (16 MiB).
pub const DEFAULT_CHUNKED_THRESHOLD: u64 = 16 * 1024 * 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Server Runtime
// ─────────────────────────────────────────────────────────────────────────────

/// Worker threads for each media server runtime.
///
/// Two threads keep one stalled transfer from starving the accept loop.
pub const DEFAULT_WORKER_THREADS: usize = 2;

/// Upper bound on how long `stop()` waits for in-flight transfers
/// before the runtime is torn down forcibly.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(2);
