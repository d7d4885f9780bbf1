//! Muninn bridge entry point.
//!
//! This binary lets a web browser talk to a plain TCP server that speaks a
//! newline-delimited text protocol (MUDs, chat servers, line-based admin
//! consoles).  Browsers cannot open raw TCP sockets, so the bridge accepts a
//! WebSocket and relays it: every line from the server becomes one text
//! frame, and every text frame from the browser becomes one line.
//!
//! # Usage
//!
//! ```text
//! muninn-bridge [OPTIONS]
//!
//! Options:
//!   --config <PATH>          TOML configuration file
//!   --address <IP:PORT>      HTTP listen address [default: 0.0.0.0:3001]
//!   --target <HOST:PORT>     Remote server used by GET /connect
//!   --any-origin             Accept WebSocket requests from any origin
//!   --allow-origin <ORIGIN>  Accept this origin (repeatable)
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present; both take precedence over
//! the configuration file.
//!
//! | Variable               | Description                         |
//! |------------------------|-------------------------------------|
//! | `MUNINN_CONFIG`        | Path to the configuration file      |
//! | `MUNINN_HTTP_ADDRESS`  | HTTP listen address                 |
//! | `MUNINN_BRIDGE_TARGET` | Remote server for `GET /connect`    |
//! | `RUST_LOG`             | Log filter (default `info`)         |
//!
//! # Architecture overview
//!
//! ```text
//! Web Browser  (text frames over WebSocket)
//!       ↕
//! muninn-bridge  ← this process
//!   domain/          Frame, session state, origin policy, BridgeConfig
//!   application/     record decoder, pumps, session coordinator
//!   infrastructure/
//!     http_server/   routes, origin check, dial, upgrade
//!     connector/     TCP connection to the remote server
//!     config_file/   muninn.toml
//!       ↕
//! remote server  (newline-delimited text over TCP)
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use muninn_bridge::domain::BridgeConfig;
use muninn_bridge::infrastructure::config_file::{self, FileConfig, OriginMode};
use muninn_bridge::infrastructure::Server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WebSocket-to-line-protocol bridge.
///
/// Every value left unset here falls back to the configuration file, and then
/// to the built-in default.
#[derive(Debug, Parser)]
#[command(
    name = "muninn-bridge",
    about = "Lets a browser talk to a newline-delimited TCP text server over WebSocket",
    version
)]
struct Cli {
    /// Configuration file.  When omitted, `./muninn.toml` and
    /// `$HOME/.muninn/muninn.toml` are tried in turn.
    #[arg(long, env = "MUNINN_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen address (`ip:port`).
    #[arg(long, env = "MUNINN_HTTP_ADDRESS")]
    address: Option<String>,

    /// Remote `host:port` dialled by `GET /connect`.
    #[arg(long, env = "MUNINN_BRIDGE_TARGET")]
    target: Option<String>,

    /// Accept WebSocket requests from any origin.
    ///
    /// Only use this when the bridge is not reachable from untrusted pages.
    #[arg(long, conflicts_with = "allow_origin")]
    any_origin: bool,

    /// Accept WebSocket requests from this origin, e.g.
    /// `https://play.example.org`.  May be given more than once.
    #[arg(long = "allow-origin", value_name = "ORIGIN")]
    allow_origin: Vec<String>,
}

impl Cli {
    /// Overlays the command-line values on top of the file configuration.
    fn apply(&self, mut file: FileConfig) -> FileConfig {
        if let Some(address) = &self.address {
            file.http.address = address.clone();
        }
        if let Some(target) = &self.target {
            file.bridge.target = Some(target.clone());
        }
        if self.any_origin {
            file.origin.mode = OriginMode::Any;
            file.origin.allowed.clear();
        } else if !self.allow_origin.is_empty() {
            file.origin.mode = OriginMode::AllowList;
            file.origin.allowed = self.allow_origin.clone();
        }
        file
    }

    /// Loads the file configuration, applies CLI overrides, and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// merged values are invalid.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        let file = config_file::load(self.config.as_deref())
            .context("failed to load configuration file")?;
        self.apply(file)
            .into_bridge_config()
            .context("invalid configuration")
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised; `RUST_LOG` controls the level.
/// 2. CLI arguments are parsed and merged with the configuration file.
/// 3. The HTTP listener is bound.
/// 4. A Ctrl+C handler is spawned; it cancels the shutdown token, which
///    stops the accept loop and ends every open session.
/// 5. The server runs until the token is cancelled.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config = Cli::parse().into_bridge_config()?;

    info!("muninn bridge starting, http={}", config.bind_addr);

    // ── Graceful shutdown ─────────────────────────────────────────────────────
    let shutdown = CancellationToken::new();
    let server = Server::bind(config, shutdown.clone()).await?;

    let on_ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                on_ctrl_c.cancel();
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    server.run().await?;

    info!("muninn bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
