//! Broadcast-once session shutdown signal.
//!
//! Both pumps hold a clone of the same [`ShutdownSignal`].  Whichever pump
//! sees a terminal condition first calls [`ShutdownSignal::trigger`] with the
//! cause; that records the cause (first one wins) and wakes every task
//! awaiting [`ShutdownSignal::cancelled`].  Triggering again is harmless.
//!
//! The signal can be derived from a parent `CancellationToken` (the server's
//! shutdown token), so stopping the server ends every session with
//! [`TerminationCause::Shutdown`].

use std::sync::{Arc, OnceLock};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::domain::TerminationCause;

/// One-shot shutdown signal shared by the tasks of a single session.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
    cause: Arc<OnceLock<TerminationCause>>,
}

impl ShutdownSignal {
    /// A standalone signal with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that also fires when `parent` is cancelled.
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            cause: Arc::new(OnceLock::new()),
        }
    }

    /// Records `cause` (if no cause was recorded yet) and fires the signal.
    ///
    /// Returns `true` if this call's cause is the one that was kept.
    pub fn trigger(&self, cause: TerminationCause) -> bool {
        let recorded = self.cause.set(cause).is_ok();
        self.token.cancel();
        recorded
    }

    /// Fires the signal without recording a cause.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// `true` once the signal has fired, from any source.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal has fired.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// The first recorded cause.
    ///
    /// A signal that fired without a recorded cause was cancelled from the
    /// parent token, so this reports [`TerminationCause::Shutdown`] for it.
    /// Returns `None` while the signal has not fired.
    pub fn cause(&self) -> Option<TerminationCause> {
        if let Some(cause) = self.cause.get() {
            return Some(cause.clone());
        }
        self.is_triggered().then_some(TerminationCause::Shutdown)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
