//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It is assembled at startup from the TOML file and CLI flags (see
//! `infrastructure::config_file` and `main.rs`), or from defaults in tests.
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! reads inside the domain) makes the bridge easy to embed in tests.

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::origin::OriginPolicy;

/// Default HTTP listen port.
pub const DEFAULT_HTTP_PORT: u16 = 3001;

/// Default upper bound on one remote line, terminator excluded.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// All runtime configuration for the bridge.
///
/// Build this struct once at startup and wrap it in an `Arc` so it can be
/// shared cheaply across all session tasks.
///
/// # Example
///
/// ```rust
/// use muninn_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 3001);
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// The address and port the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// Remote `host:port` dialled by `GET /connect` (the route without an
    /// address segment).  `None` disables that route.
    pub default_target: Option<String>,

    /// Which browser origins may open a bridge.
    pub origin_policy: OriginPolicy,

    /// Upper bound on establishing the remote TCP connection.
    pub dial_timeout: Duration,

    /// Longest remote line accepted before the session is torn down.
    pub max_line_length: usize,

    /// How long teardown waits for the upstream pump before aborting it.
    pub teardown_grace: Duration,
}

impl Default for BridgeConfig {
    /// | Field           | Default          |
    /// |-----------------|------------------|
    /// | bind_addr       | `0.0.0.0:3001`   |
    /// | default_target  | none             |
    /// | origin_policy   | same-origin      |
    /// | dial_timeout    | 10 seconds       |
    /// | max_line_length | 64 KiB           |
    /// | teardown_grace  | 5 seconds        |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_HTTP_PORT)),
            default_target: None,
            origin_policy: OriginPolicy::SameOrigin,
            dial_timeout: Duration::from_secs(10),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            teardown_grace: Duration::from_secs(5),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
