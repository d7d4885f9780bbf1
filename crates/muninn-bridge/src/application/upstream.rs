//! Upstream pump: remote server → browser.
//!
//! Reads newline-delimited records from the remote byte stream and sends each
//! one to the browser as a single text frame, in order, without batching.
//!
//! # Termination
//!
//! | Condition               | Cause recorded                          |
//! |-------------------------|-----------------------------------------|
//! | remote EOF              | [`TerminationCause::RemoteEof`]         |
//! | read / decode error     | [`TerminationCause::RemoteRead`]        |
//! | frame send failed       | [`TerminationCause::ForwardWrite`]      |
//! | shutdown signal fired   | none (someone else already recorded it) |
//!
//! The pump never closes either connection; that is the coordinator's job.

use std::fmt;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

use crate::application::records::RecordCodec;
use crate::application::shutdown::ShutdownSignal;
use crate::domain::{Direction, Frame, SessionId, TerminationCause};

/// Forwards remote records to `client` until the session ends.
///
/// Both the read and the send are raced against `shutdown`, so the pump exits
/// at its next poll point once the signal fires, and never enqueues a frame
/// after that.  Delivery is at-most-once: a failed send is not retried.
///
/// Returns the number of text frames delivered.
pub async fn pump_upstream<R, Si>(
    remote: R,
    client: &mut Si,
    codec: RecordCodec,
    shutdown: &ShutdownSignal,
    session: SessionId,
) -> u64
where
    R: AsyncRead + Unpin,
    Si: Sink<Frame> + Unpin,
    Si::Error: fmt::Display,
{
    let mut records = FramedRead::new(remote, codec);
    let mut forwarded = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("session {session}: upstream pump stopping on shutdown signal");
                return forwarded;
            }
            next = records.next() => next,
        };

        let record = match next {
            Some(Ok(record)) => record,
            Some(Err(e)) => {
                warn!("session {session}: read upstream: {e}");
                shutdown.trigger(TerminationCause::RemoteRead(e.to_string()));
                return forwarded;
            }
            None => {
                debug!("session {session}: remote connection closed (EOF)");
                shutdown.trigger(TerminationCause::RemoteEof);
                return forwarded;
            }
        };

        // The other side may have failed while we were blocked on the read.
        if shutdown.is_triggered() {
            return forwarded;
        }

        let sent = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return forwarded,
            sent = client.send(Frame::Text(record)) => sent,
        };

        if let Err(e) = sent {
            warn!("session {session}: write downstream: {e}");
            shutdown.trigger(TerminationCause::ForwardWrite {
                direction: Direction::ToClient,
                reason: e.to_string(),
            });
            return forwarded;
        }

        forwarded += 1;
        debug!("session {session}: remote → client frame #{forwarded}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
