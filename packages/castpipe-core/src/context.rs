//! Local address detection and serving URL construction.
//!
//! Cast receivers fetch media from the URL we hand them, so the address in
//! it must be one they can route to. [`RouteIpDetector`] asks the OS which
//! local address it would use for outbound traffic, which is the usual
//! answer on a home LAN. Other strategies plug in through [`IpDetector`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use crate::protocol_constants::ROUTE_PROBE_ADDR;

/// Trait for detecting the local IP address.
///
/// Different environments may need different detection strategies.
/// This trait allows injecting the appropriate detector.
pub trait IpDetector: Send + Sync {
    /// Detects the local IP address.
    fn detect(&self) -> Result<IpAddr, NetworkError>;
}

/// Default detector: the source address of the outbound IPv4 route.
///
/// Connecting a UDP socket only selects a route; no datagram is sent, so
/// this works without actual internet access as long as a default route
/// exists.
#[derive(Debug, Clone)]
pub struct RouteIpDetector {
    probe_addr: String,
}

impl RouteIpDetector {
    /// Creates a detector probing the default external address.
    #[must_use]
    pub fn new() -> Self {
        Self {
            probe_addr: ROUTE_PROBE_ADDR.to_string(),
        }
    }

    /// Creates a detector probing a custom address (`host:port`).
    #[must_use]
    pub fn with_probe(probe_addr: impl Into<String>) -> Self {
        Self {
            probe_addr: probe_addr.into(),
        }
    }
}

impl Default for RouteIpDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl IpDetector for RouteIpDetector {
    fn detect(&self) -> Result<IpAddr, NetworkError> {
        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
            .map_err(|e| NetworkError::Detection(e.to_string()))?;
        socket
            .connect(self.probe_addr.as_str())
            .map_err(|e| NetworkError::Detection(format!("{}: {}", self.probe_addr, e)))?;
        let local = socket
            .local_addr()
            .map_err(|e| NetworkError::Detection(e.to_string()))?;

        match local.ip() {
            IpAddr::V4(ip) if !ip.is_unspecified() => Ok(IpAddr::V4(ip)),
            _ => Err(NetworkError::NoIpv4),
        }
    }
}

/// Fallback detector using the system's network interfaces.
#[derive(Debug, Clone, Default)]
pub struct InterfaceIpDetector;

impl IpDetector for InterfaceIpDetector {
    fn detect(&self) -> Result<IpAddr, NetworkError> {
        local_ip_address::local_ip().map_err(|e| NetworkError::Detection(e.to_string()))
    }
}

/// Detector that always reports a configured advertise address.
#[derive(Debug, Clone, Copy)]
pub struct FixedIpDetector(pub IpAddr);

impl IpDetector for FixedIpDetector {
    fn detect(&self) -> Result<IpAddr, NetworkError> {
        Ok(self.0)
    }
}

/// Tries the route probe first and falls back to interface enumeration.
#[derive(Debug, Clone, Default)]
pub struct LocalIpDetector {
    route: RouteIpDetector,
    interfaces: InterfaceIpDetector,
}

impl LocalIpDetector {
    /// Creates a new `LocalIpDetector` wrapped in an Arc.
    #[must_use]
    pub fn arc() -> Arc<dyn IpDetector> {
        Arc::new(Self::default())
    }
}

impl IpDetector for LocalIpDetector {
    fn detect(&self) -> Result<IpAddr, NetworkError> {
        self.route.detect().or_else(|e| {
            log::debug!("[Network] Route probe failed ({}), trying interfaces", e);
            self.interfaces.detect()
        })
    }
}

/// Errors that can occur during network operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// Could not detect local IP address.
    #[error("Failed to detect local IP: {0}")]
    Detection(String),

    /// The outbound route has no usable IPv4 source address.
    #[error("No routable IPv4 address available")]
    NoIpv4,
}

/// Builder for constructing URLs for the media server.
pub struct UrlBuilder {
    ip: IpAddr,
    port: u16,
}

impl UrlBuilder {
    /// Creates a new `UrlBuilder` for the given server address.
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Returns the base URL for the server (e.g., `http://192.168.1.100:8000`).
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", SocketAddr::new(self.ip, self.port))
    }

    /// Returns the URL a receiver should fetch `file_name` from.
    ///
    /// The server ignores the path, but receivers often use it to guess the
    /// container, so the real file name is kept (percent-encoded).
    #[must_use]
    pub fn media_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.base_url(), encode_path_segment(file_name))
    }
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_builder_generates_media_url() {
        let builder = UrlBuilder::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)), 8000);
        assert_eq!(builder.base_url(), "http://192.168.1.100:8000");
        assert_eq!(
            builder.media_url("movie.mp4"),
            "http://192.168.1.100:8000/movie.mp4"
        );
    }

    #[test]
    fn media_url_encodes_unsafe_characters() {
        let builder = UrlBuilder::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)), 8000);
        assert_eq!(
            builder.media_url("My Movie (2020).mkv"),
            "http://10.0.0.5:8000/My%20Movie%20%282020%29.mkv"
        );
    }

    #[test]
    fn fixed_detector_returns_configured_ip() {
        let ip = IpAddr::V4(Ipv4Addr::new(172, 16, 0, 9));
        assert_eq!(FixedIpDetector(ip).detect().unwrap(), ip);
    }

    #[test]
    fn route_probe_to_loopback_reports_loopback() {
        let detector = RouteIpDetector::with_probe("127.0.0.1:9");
        assert_eq!(
            detector.detect().unwrap(),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
    }
}
