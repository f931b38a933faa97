//! Per-response delivery tracking for chunked transfers.

use std::io;
use std::net::SocketAddr;
use std::time::Instant;

use bytes::Bytes;

use crate::media::ByteRange;

/// Logs the outcome of one chunked transfer when dropped.
///
/// The guard travels inside the response body stream, so it is dropped
/// whether the transfer completes, fails on a read, or the client closes
/// the connection halfway.
pub struct TransferGuard {
    client: SocketAddr,
    range: ByteRange,
    started: Instant,
    bytes_sent: u64,
    chunks_sent: u64,
    first_error: Option<String>,
}

impl TransferGuard {
    pub fn new(client: SocketAddr, range: ByteRange) -> Self {
        log::info!(
            "[Media] Chunked transfer started: client={}, range={}, bytes={}",
            client,
            range,
            range.len()
        );
        Self {
            client,
            range,
            started: Instant::now(),
            bytes_sent: 0,
            chunks_sent: 0,
            first_error: None,
        }
    }

    /// Records one item yielded by the body stream.
    pub fn record(&mut self, item: &io::Result<Bytes>) {
        match item {
            Ok(chunk) => {
                self.chunks_sent += 1;
                self.bytes_sent += chunk.len() as u64;
            }
            Err(e) => {
                if self.first_error.is_none() {
                    self.first_error = Some(e.to_string());
                }
            }
        }
    }

    /// Whether every byte of the range was handed to the HTTP stack.
    pub fn is_complete(&self) -> bool {
        self.bytes_sent >= self.range.len() && self.first_error.is_none()
    }
}

impl Drop for TransferGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_millis();

        if let Some(ref err) = self.first_error {
            log::warn!(
                "[Media] Chunked transfer failed: client={}, sent={}/{} bytes in {} chunks, {}ms, error={}",
                self.client,
                self.bytes_sent,
                self.range.len(),
                self.chunks_sent,
                elapsed_ms,
                err
            );
        } else if self.is_complete() {
            log::info!(
                "[Media] Chunked transfer complete: client={}, sent={} bytes in {} chunks, {}ms",
                self.client,
                self.bytes_sent,
                self.chunks_sent,
                elapsed_ms
            );
        } else {
            log::info!(
                "[Media] Chunked transfer ended early (client closed?): client={}, sent={}/{} bytes, {}ms",
                self.client,
                self.bytes_sent,
                self.range.len(),
                elapsed_ms
            );
        }
    }
}
