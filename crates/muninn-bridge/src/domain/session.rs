//! Session identity, lifecycle states, and termination causes.
//!
//! A session is one bridged conversation: one browser WebSocket paired with
//! one remote TCP connection.  Its lifecycle is a small state machine:
//!
//! ```text
//! Connecting ──► Upgrading ──► Bridging ──► Closing ──► Closed
//!      │             │            ▲            ▲
//!      └─────────────┴────────────┴── error ───┘
//! ```
//!
//! Any error before or during bridging moves straight to `Closing`.
//! `Closed` is terminal.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

// ── Identity ──────────────────────────────────────────────────────────────────

/// Log-correlation identifier for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

/// States a session moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Dialling the remote server.
    Connecting,
    /// Remote connection open; performing the WebSocket handshake.
    Upgrading,
    /// Both pumps running.
    Bridging,
    /// Tearing down; connections are being closed.
    Closing,
    /// Both connections closed.
    Closed,
}

impl SessionState {
    /// Returns `true` if `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Upgrading)
                | (Upgrading, Bridging)
                | (Connecting | Upgrading | Bridging, Closing)
                | (Closing, Closed)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Upgrading => "upgrading",
            SessionState::Bridging => "bridging",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Returned when a transition is not in the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal session transition {from} -> {to}")]
pub struct LifecycleError {
    pub from: SessionState,
    pub to: SessionState,
}

/// Tracks the current [`SessionState`] of one session.
#[derive(Debug)]
pub struct SessionLifecycle {
    state: SessionState,
}

impl SessionLifecycle {
    /// Starts in [`SessionState::Connecting`].
    pub fn new() -> Self {
        Self {
            state: SessionState::Connecting,
        }
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] and leaves the state unchanged when the
    /// transition is illegal (e.g. anything out of `Closed`).
    pub fn advance(&mut self, next: SessionState) -> Result<(), LifecycleError> {
        if !self.state.can_transition_to(next) {
            return Err(LifecycleError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

// ── Termination ───────────────────────────────────────────────────────────────

/// Which way a failed forward was travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Remote line → browser frame.
    ToClient,
    /// Browser frame → remote line.
    ToRemote,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToClient => f.write_str("client"),
            Direction::ToRemote => f.write_str("remote"),
        }
    }
}

/// Why a session ended.  Only the first cause observed is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminationCause {
    /// The remote server closed its side of the connection.
    #[error("remote closed the connection")]
    RemoteEof,

    /// Reading from the remote server failed.
    #[error("remote read failed: {0}")]
    RemoteRead(String),

    /// The browser closed the WebSocket.
    #[error("client closed the connection")]
    ClientClosed,

    /// Receiving from the browser failed (protocol violation, reset, ...).
    #[error("client read failed: {0}")]
    ClientRead(String),

    /// Forwarding a message failed.
    #[error("write to {direction} failed: {reason}")]
    ForwardWrite { direction: Direction, reason: String },

    /// The server is shutting down.
    #[error("server shutting down")]
    Shutdown,
}

impl TerminationCause {
    /// `true` for causes that are part of an orderly stop rather than a
    /// failure or peer close.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, TerminationCause::Shutdown)
    }
}

/// Summary of a finished session, logged by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub id: SessionId,
    pub remote_address: String,
    pub cause: TerminationCause,
    /// Text frames delivered to the browser.
    pub frames_to_client: u64,
    /// Lines written to the remote server.
    pub lines_to_remote: u64,
    /// State at the time the report was produced (always `Closed` after a run).
    pub state: SessionState,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_lifecycle_starts_connecting() {
        assert_eq!(SessionLifecycle::new().state(), SessionState::Connecting);
    }

    #[test]
    fn test_happy_path_transitions() {
        // Arrange
        let mut lifecycle = SessionLifecycle::new();

        // Act / Assert
        for next in [
            SessionState::Upgrading,
            SessionState::Bridging,
            SessionState::Closing,
            SessionState::Closed,
        ] {
            lifecycle.advance(next).unwrap();
            assert_eq!(lifecycle.state(), next);
        }
    }

    #[test]
    fn test_error_in_any_live_state_goes_to_closing() {
        for from in [
            SessionState::Connecting,
            SessionState::Upgrading,
            SessionState::Bridging,
        ] {
            assert!(from.can_transition_to(SessionState::Closing), "{from}");
        }
    }

    #[test]
    fn test_closed_is_terminal() {
        for next in [
            SessionState::Connecting,
            SessionState::Upgrading,
            SessionState::Bridging,
            SessionState::Closing,
            SessionState::Closed,
        ] {
            assert!(!SessionState::Closed.can_transition_to(next));
        }
    }

    #[test]
    fn test_closing_twice_is_rejected() {
        // Arrange
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.advance(SessionState::Closing).unwrap();

        // Act
        let err = lifecycle.advance(SessionState::Closing).unwrap_err();

        // Assert: state unchanged, error names both ends
        assert_eq!(lifecycle.state(), SessionState::Closing);
        assert_eq!(
            err,
            LifecycleError {
                from: SessionState::Closing,
                to: SessionState::Closing,
            }
        );
        assert_eq!(err.to_string(), "illegal session transition closing -> closing");
    }

    #[test]
    fn test_cannot_skip_upgrade() {
        assert!(!SessionState::Connecting.can_transition_to(SessionState::Bridging));
    }

    #[test]
    fn test_cannot_go_backwards() {
        assert!(!SessionState::Bridging.can_transition_to(SessionState::Upgrading));
        assert!(!SessionState::Closing.can_transition_to(SessionState::Bridging));
    }

    #[test]
    fn test_cause_messages() {
        assert_eq!(
            TerminationCause::RemoteEof.to_string(),
            "remote closed the connection"
        );
        let cause = TerminationCause::ForwardWrite {
            direction: Direction::ToRemote,
            reason: "broken pipe".into(),
        };
        assert_eq!(cause.to_string(), "write to remote failed: broken pipe");
    }

    #[test]
    fn test_only_shutdown_is_shutdown() {
        assert!(TerminationCause::Shutdown.is_shutdown());
        assert!(!TerminationCause::ClientClosed.is_shutdown());
    }
}
