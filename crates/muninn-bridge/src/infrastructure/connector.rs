//! TCP connection to the remote line-protocol server.
//!
//! Each browser session gets its own TCP connection.  There is no pooling,
//! no DNS caching and no retry: if the dial fails, the HTTP request that
//! asked for it is answered with `502 Bad Gateway` and nothing else happens.
//!
//! This module uses only `tokio::net::TcpStream`, which works identically on
//! Windows, Linux, and macOS.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Why the remote server could not be reached.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The address is not of the form `host:port`.
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: &'static str },

    /// The dial did not complete within the configured timeout.
    #[error("timed out after {timeout:?} connecting to {address}")]
    Timeout { address: String, timeout: Duration },

    /// Name resolution or the TCP handshake failed (refused, unreachable, ...).
    #[error("failed to connect to {address}: {source}")]
    Io {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// Opens outbound TCP connections with a bounded dial time.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    dial_timeout: Duration,
}

impl TcpConnector {
    pub fn new(dial_timeout: Duration) -> Self {
        Self { dial_timeout }
    }

    /// Opens a new TCP connection to `address` (`host:port`).
    ///
    /// The caller owns the returned stream and is responsible for closing it
    /// on every exit path (dropping it is enough).
    ///
    /// # Errors
    ///
    /// - [`ConnectError::InvalidAddress`] without touching the network when
    ///   `address` is malformed.
    /// - [`ConnectError::Timeout`] when the dial exceeds the timeout.
    /// - [`ConnectError::Io`] for refused connections, unreachable hosts and
    ///   name resolution failures.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use muninn_bridge::infrastructure::connector::TcpConnector;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let connector = TcpConnector::new(Duration::from_secs(10));
    /// let stream = connector.connect("mud.example.org:4000").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(&self, address: &str) -> Result<TcpStream, ConnectError> {
        validate_address(address)?;

        let stream = timeout(self.dial_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| ConnectError::Timeout {
                address: address.to_string(),
                timeout: self.dial_timeout,
            })?
            .map_err(|source| ConnectError::Io {
                address: address.to_string(),
                source,
            })?;

        // Line-oriented servers are interactive; don't hold small writes back.
        if let Err(e) = stream.set_nodelay(true) {
            debug!("could not set TCP_NODELAY for {address}: {e}");
        }

        Ok(stream)
    }
}

/// Checks that `address` looks like `host:port` with a numeric port.
///
/// Bracketed IPv6 literals (`[::1]:4000`) are accepted.
fn validate_address(address: &str) -> Result<(), ConnectError> {
    let invalid = |reason| ConnectError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| invalid("missing port"))?;
    if host.is_empty() || host == "[]" {
        return Err(invalid("missing host"));
    }
    if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
        return Err(invalid("IPv6 hosts must be bracketed"));
    }
    match port.parse::<u16>() {
        Ok(0) => Err(invalid("port must be non-zero")),
        Ok(_) => Ok(()),
        Err(_) => Err(invalid("port is not a number in 1-65535")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
