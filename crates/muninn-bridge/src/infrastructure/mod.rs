//! Infrastructure layer for muninn-bridge.
//!
//! The infrastructure layer handles all I/O: serving HTTP, upgrading browser
//! requests to WebSocket, opening TCP connections to remote servers, and
//! reading the configuration file.
//!
//! # Responsibilities
//!
//! - Binding the HTTP listener and routing `/connect` requests
//! - Enforcing the origin policy before anything is dialled
//! - Opening TCP connections to the remote line-protocol server
//! - Adapting axum's WebSocket to the transport-neutral [`Frame`] stream/sink
//! - Loading and validating `muninn.toml`
//!
//! # What does NOT belong here?
//!
//! - The pumps and session teardown (that is the application layer)
//! - Session state and configuration types (that is the domain layer)
//! - Command-line parsing (that is done in `main.rs`)
//!
//! [`Frame`]: crate::domain::Frame

pub mod config_file;
pub mod connector;
pub mod http_server;

pub use config_file::{ConfigError, FileConfig};
pub use connector::{ConnectError, TcpConnector};
pub use http_server::{build_router, AppState, Server};
