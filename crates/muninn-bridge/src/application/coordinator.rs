//! Session coordinator: runs both pumps for one session and tears it down.
//!
//! ```text
//!                   ┌──────────── upstream task (tracked) ────────────┐
//! remote reader ──► │ pump_upstream: record → Frame::Text             │ ──► frames_out
//!                   └─────────────────────────────────────────────────┘
//!                   ┌──────────── request task (inline) ──────────────┐
//! frames_in ──────► │ pump_downstream: Frame::Text → "payload\n"      │ ──► remote writer
//!                   └─────────────────────────────────────────────────┘
//! ```
//!
//! Whichever pump stops first fires the shared [`ShutdownSignal`]; the other
//! one notices at its next poll point.  The coordinator then joins the
//! upstream task (which hands its halves back), closes the browser side,
//! shuts the remote side down, and logs a [`SessionReport`].
//!
//! # Exactly-once close
//!
//! The pumps only ever *borrow* the connection halves.  Closing is done here,
//! by value, after both pumps have returned, so neither half can be closed
//! twice or used after close.

use std::fmt;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::application::downstream::pump_downstream;
use crate::application::records::RecordCodec;
use crate::application::shutdown::ShutdownSignal;
use crate::application::upstream::pump_upstream;
use crate::domain::{
    BridgeConfig, Frame, SessionId, SessionLifecycle, SessionReport, SessionState,
    TerminationCause,
};

/// One bridged conversation: an open remote connection waiting for (or
/// running against) a browser WebSocket.
///
/// Created by the HTTP layer after a successful dial; consumed by
/// [`Session::run`].
pub struct Session<U> {
    id: SessionId,
    remote_address: String,
    upstream: U,
    lifecycle: SessionLifecycle,
    shutdown: ShutdownSignal,
    max_line_length: usize,
    teardown_grace: Duration,
}

impl<U> Session<U>
where
    U: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wraps an already-dialled remote connection.
    ///
    /// `lifecycle` carries the state the caller has reached so far (normally
    /// `Upgrading`); `shutdown` is usually a child of the server's shutdown
    /// token.
    pub fn new(
        id: SessionId,
        remote_address: impl Into<String>,
        upstream: U,
        lifecycle: SessionLifecycle,
        shutdown: ShutdownSignal,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            id,
            remote_address: remote_address.into(),
            upstream,
            lifecycle,
            shutdown,
            max_line_length: config.max_line_length,
            teardown_grace: config.teardown_grace,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    /// Bridges the remote connection to the browser until either side ends.
    ///
    /// `frames_out` / `frames_in` are the two halves of the browser
    /// connection.  Both connections are closed before this returns.
    pub async fn run<Si, St, E>(self, frames_out: Si, mut frames_in: St) -> SessionReport
    where
        Si: Sink<Frame> + Unpin + Send + 'static,
        Si::Error: fmt::Display + Send,
        St: Stream<Item = Result<Frame, E>> + Unpin,
        E: fmt::Display,
    {
        let Session {
            id,
            remote_address,
            upstream,
            mut lifecycle,
            shutdown,
            max_line_length,
            teardown_grace,
        } = self;

        advance(&mut lifecycle, SessionState::Bridging, id);
        info!("session {id}: bridging to {remote_address}");

        let (remote_reader, mut remote_writer) = tokio::io::split(upstream);

        // ── Upstream pump: tracked background task ────────────────────────────
        //
        // The task owns its halves while it runs and hands them back when it
        // returns, so closing stays with the coordinator.
        let mut upstream_task = tokio::spawn({
            let shutdown = shutdown.clone();
            let mut frames_out = frames_out;
            let mut remote_reader = remote_reader;
            async move {
                let forwarded = pump_upstream(
                    &mut remote_reader,
                    &mut frames_out,
                    RecordCodec::new(max_line_length),
                    &shutdown,
                    id,
                )
                .await;
                (forwarded, remote_reader, frames_out)
            }
        });

        // ── Downstream pump: runs on this task until the session ends ─────────
        let lines_to_remote =
            pump_downstream(&mut frames_in, &mut remote_writer, &shutdown, id).await;

        // Whatever stopped the downstream pump, the upstream pump must stop too.
        shutdown.cancel();
        advance(&mut lifecycle, SessionState::Closing, id);

        // ── Join the upstream pump ────────────────────────────────────────────
        let mut frames_to_client = 0;
        let mut client_sink = None;
        match timeout(teardown_grace, &mut upstream_task).await {
            Ok(Ok((forwarded, remote_reader, frames_out))) => {
                frames_to_client = forwarded;
                drop(remote_reader);
                client_sink = Some(frames_out);
            }
            Ok(Err(e)) => {
                // A panic in the pump is contained to this session.
                error!("session {id}: upstream pump failed: {e}");
            }
            Err(_) => {
                warn!(
                    "session {id}: upstream pump did not stop within {teardown_grace:?}; aborting"
                );
                upstream_task.abort();
                let _ = upstream_task.await;
            }
        }

        // ── Close both connections, once each ─────────────────────────────────
        if let Some(mut sink) = client_sink {
            match timeout(teardown_grace, sink.close()).await {
                Ok(Ok(())) => debug!("session {id}: client connection closed"),
                Ok(Err(e)) => debug!("session {id}: close downstream: {e}"),
                Err(_) => debug!("session {id}: close downstream timed out"),
            }
        }
        drop(frames_in);

        match timeout(teardown_grace, remote_writer.shutdown()).await {
            Ok(Ok(())) => debug!("session {id}: remote connection closed"),
            Ok(Err(e)) => debug!("session {id}: close upstream: {e}"),
            Err(_) => debug!("session {id}: close upstream timed out"),
        }
        drop(remote_writer);

        advance(&mut lifecycle, SessionState::Closed, id);

        let report = SessionReport {
            id,
            cause: shutdown.cause().unwrap_or(TerminationCause::Shutdown),
            remote_address,
            frames_to_client,
            lines_to_remote,
            state: lifecycle.state(),
        };
        log_report(&report);
        report
    }
}

/// Applies a lifecycle transition, logging (rather than failing on) an
/// illegal one.
fn advance(lifecycle: &mut SessionLifecycle, next: SessionState, id: SessionId) {
    match lifecycle.advance(next) {
        Ok(()) => debug!("session {id}: {next}"),
        Err(e) => error!("session {id}: {e}"),
    }
}

fn log_report(report: &SessionReport) {
    let SessionReport {
        id,
        remote_address,
        cause,
        frames_to_client,
        lines_to_remote,
        ..
    } = report;

    if cause.is_shutdown() {
        info!(
            "session {id}: closed ({cause}) remote={remote_address} \
             frames_to_client={frames_to_client} lines_to_remote={lines_to_remote}"
        );
    } else {
        warn!(
            "session {id}: closed ({cause}) remote={remote_address} \
             frames_to_client={frames_to_client} lines_to_remote={lines_to_remote}"
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
