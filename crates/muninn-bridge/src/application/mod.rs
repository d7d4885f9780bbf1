//! Application layer for muninn-bridge.
//!
//! This is the bridge proper.  Everything here is generic over the transport
//! traits (`AsyncRead`/`AsyncWrite` for the remote side, `Stream`/`Sink` of
//! [`Frame`](crate::domain::Frame) for the browser side), so the same code
//! runs against real sockets in production and in-memory pipes in tests.
//!
//! # Responsibilities
//!
//! - Splitting the remote byte stream into records ([`records`])
//! - Remote → browser forwarding ([`upstream`])
//! - Browser → remote forwarding ([`downstream`])
//! - The broadcast-once shutdown signal ([`shutdown`])
//! - Running both pumps for one session and tearing it down ([`coordinator`])
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or listening for connections (infrastructure)
//! - HTTP routing and the WebSocket handshake (infrastructure)

pub mod coordinator;
pub mod downstream;
pub mod records;
pub mod shutdown;
pub mod upstream;

pub use coordinator::Session;
pub use downstream::pump_downstream;
pub use records::{RecordCodec, RecordError};
pub use shutdown::ShutdownSignal;
pub use upstream::pump_upstream;
