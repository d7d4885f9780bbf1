//! Domain layer for muninn-bridge.
//!
//! The domain layer contains pure types that have no dependencies on I/O,
//! networking, or async runtimes.  This makes them easy to test in isolation.
//!
//! # What belongs in the domain layer?
//!
//! - Runtime configuration ([`BridgeConfig`]) and the [`OriginPolicy`]
//! - The transport-neutral [`Frame`] type the pumps exchange
//! - Session identity, lifecycle states, and termination causes
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `WebSocket` types
//! - File I/O or environment variable reading

pub mod config;
pub mod frame;
pub mod origin;
pub mod session;

pub use config::BridgeConfig;
pub use frame::Frame;
pub use origin::OriginPolicy;
pub use session::{
    Direction, LifecycleError, SessionId, SessionLifecycle, SessionReport, SessionState,
    TerminationCause,
};
