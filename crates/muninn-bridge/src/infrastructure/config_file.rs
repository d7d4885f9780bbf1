//! TOML configuration file for the bridge.
//!
//! The file is optional.  Lookup order:
//!
//! 1. the path given with `--config` / `MUNINN_CONFIG` (must exist);
//! 2. `./muninn.toml`;
//! 3. `$HOME/.muninn/muninn.toml`;
//! 4. built-in defaults when none of the above exists.
//!
//! ```toml
//! [http]
//! address = "0.0.0.0:3001"
//!
//! [bridge]
//! target = "mud.example.org:4000"   # used by GET /connect
//! dial_timeout_secs = 10
//! max_line_length = 65536
//! teardown_grace_secs = 5
//!
//! [origin]
//! mode = "allow-list"               # same-origin | allow-list | any
//! allowed = ["https://play.example.org"]
//! ```
//!
//! Fields annotated with `#[serde(default = "...")]` fall back to their
//! default when absent, so a file only needs the keys it changes.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::config::{BridgeConfig, DEFAULT_HTTP_PORT, DEFAULT_MAX_LINE_LENGTH};
use crate::domain::OriginPolicy;

/// File name searched for in the working directory and `$HOME/.muninn`.
pub const CONFIG_FILE_NAME: &str = "muninn.toml";

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file {0} not found")]
    NotFound(PathBuf),

    /// A file system I/O error occurred.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level shape of `muninn.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub bridge: BridgeSection,
    #[serde(default)]
    pub origin: OriginSection,
}

/// `[http]`: listener settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    /// `ip:port` the HTTP server binds to.
    #[serde(default = "default_http_address")]
    pub address: String,
}

/// `[bridge]`: session settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BridgeSection {
    /// Remote `host:port` for `GET /connect`.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default = "default_dial_timeout_secs")]
    pub dial_timeout_secs: u64,
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    #[serde(default = "default_teardown_grace_secs")]
    pub teardown_grace_secs: u64,
}

/// `[origin]`: which browser origins may connect.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OriginSection {
    #[serde(default)]
    pub mode: OriginMode,
    /// Origins accepted in `allow-list` mode.
    #[serde(default)]
    pub allowed: Vec<String>,
}

/// Serialized name of an [`OriginPolicy`] variant.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OriginMode {
    #[default]
    SameOrigin,
    AllowList,
    Any,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_http_address() -> String {
    format!("0.0.0.0:{DEFAULT_HTTP_PORT}")
}
fn default_dial_timeout_secs() -> u64 {
    10
}
fn default_max_line_length() -> usize {
    DEFAULT_MAX_LINE_LENGTH
}
fn default_teardown_grace_secs() -> u64 {
    5
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            address: default_http_address(),
        }
    }
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            target: None,
            dial_timeout_secs: default_dial_timeout_secs(),
            max_line_length: default_max_line_length(),
            teardown_grace_secs: default_teardown_grace_secs(),
        }
    }
}

// ── Conversion into the runtime config ────────────────────────────────────────

impl FileConfig {
    /// Validates the file values and converts them into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the listen address does not
    /// parse, a limit is zero, or `allow-list` mode has no origins.
    pub fn into_bridge_config(self) -> Result<BridgeConfig, ConfigError> {
        let bind_addr: SocketAddr = self.http.address.trim().parse().map_err(|_| {
            ConfigError::Invalid(format!("http.address '{}' is not ip:port", self.http.address))
        })?;

        if self.bridge.dial_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "bridge.dial_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.bridge.teardown_grace_secs == 0 {
            return Err(ConfigError::Invalid(
                "bridge.teardown_grace_secs must be greater than 0".into(),
            ));
        }
        if self.bridge.max_line_length == 0 {
            return Err(ConfigError::Invalid(
                "bridge.max_line_length must be greater than 0".into(),
            ));
        }

        let origin_policy = match self.origin.mode {
            OriginMode::SameOrigin => OriginPolicy::SameOrigin,
            OriginMode::Any => OriginPolicy::Any,
            OriginMode::AllowList if self.origin.allowed.is_empty() => {
                return Err(ConfigError::Invalid(
                    "origin.mode = \"allow-list\" needs at least one entry in origin.allowed"
                        .into(),
                ));
            }
            OriginMode::AllowList => OriginPolicy::AllowList(self.origin.allowed),
        };

        let default_target = self
            .bridge
            .target
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(BridgeConfig {
            bind_addr,
            default_target,
            origin_policy,
            dial_timeout: Duration::from_secs(self.bridge.dial_timeout_secs),
            max_line_length: self.bridge.max_line_length,
            teardown_grace: Duration::from_secs(self.bridge.teardown_grace_secs),
        })
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Default search locations, in priority order.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".muninn").join(CONFIG_FILE_NAME));
    }
    paths
}

/// Loads the config file following the lookup order in the module docs.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if `explicit` is given but missing,
/// [`ConfigError::Io`] for other read failures, and [`ConfigError::Parse`]
/// for malformed TOML.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    match explicit {
        Some(path) => match read(path)? {
            Some(cfg) => Ok(cfg),
            None => Err(ConfigError::NotFound(path.to_path_buf())),
        },
        None => load_first_existing(&default_search_paths()),
    }
}

/// Loads the first of `paths` that exists, or defaults if none does.
///
/// # Errors
///
/// Same as [`load`], except that missing files are skipped.
pub fn load_first_existing(paths: &[PathBuf]) -> Result<FileConfig, ConfigError> {
    for path in paths {
        if let Some(cfg) = read(path)? {
            tracing::debug!("loaded configuration from {}", path.display());
            return Ok(cfg);
        }
    }
    Ok(FileConfig::default())
}

/// Parses `path`, returning `Ok(None)` if it does not exist.
fn read(path: &Path) -> Result<Option<FileConfig>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(toml::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
