//! muninn-bridge library crate.
//!
//! This crate lets a web browser, which can only speak WebSocket, hold a
//! conversation with a line-oriented text server reachable over raw TCP
//! (a MUD, a telnet-style chat service, ...).  Each WebSocket connection is
//! bridged to exactly one TCP connection: every line the server prints becomes
//! one text frame, and every text frame the browser sends becomes one line.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (text frames over WebSocket)
//!         ↕
//! [muninn-bridge]
//!   ├── domain/           Pure types: config, origin policy, frames, session lifecycle
//!   ├── application/      The bridge itself: record codec, two pumps, coordinator
//!   └── infrastructure/
//!         ├── http_server/  axum router, origin check, WebSocket upgrade
//!         ├── connector/    TCP dial to the remote server
//!         └── config_file/  TOML configuration loading
//!         ↕
//! Remote server (newline-delimited text over TCP)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async code.
//! - `application` is generic over `AsyncRead`/`AsyncWrite` and
//!   `Stream`/`Sink`, so it can be tested with in-memory pipes.
//! - `infrastructure` plugs real sockets (tokio, axum) into the application layer.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: the pumps and the session coordinator.
pub mod application;

/// Infrastructure layer: HTTP server, TCP connector, config file.
pub mod infrastructure;
