//! Downstream pump: browser → remote server.
//!
//! Every text frame from the browser is one command line: its payload plus a
//! single `\n` is written to the remote stream, in arrival order.
//!
//! Binary, ping and pong frames are received and dropped.  Browsers that
//! drive a line-oriented server only ever send text; binary passthrough is a
//! deliberate omission, not an oversight.

use std::fmt;

use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::application::shutdown::ShutdownSignal;
use crate::domain::{Direction, Frame, SessionId, TerminationCause};

/// Forwards browser text frames to `remote` until the session ends.
///
/// | Condition                        | Cause recorded                     |
/// |----------------------------------|------------------------------------|
/// | Close frame / end of stream      | [`TerminationCause::ClientClosed`] |
/// | receive error                    | [`TerminationCause::ClientRead`]   |
/// | remote write failed              | [`TerminationCause::ForwardWrite`] |
/// | shutdown signal fired            | none                               |
///
/// Returns the number of lines written to the remote side.
pub async fn pump_downstream<St, E, W>(
    client: &mut St,
    remote: &mut W,
    shutdown: &ShutdownSignal,
    session: SessionId,
) -> u64
where
    St: Stream<Item = Result<Frame, E>> + Unpin,
    E: fmt::Display,
    W: AsyncWrite + Unpin,
{
    let mut forwarded = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("session {session}: downstream pump stopping on shutdown signal");
                return forwarded;
            }
            next = client.next() => next,
        };

        let text = match next {
            Some(Ok(Frame::Text(text))) => text,
            Some(Ok(Frame::Close)) | None => {
                debug!("session {session}: client closed the connection");
                shutdown.trigger(TerminationCause::ClientClosed);
                return forwarded;
            }
            Some(Ok(other)) => {
                debug!("session {session}: ignoring {} frame", other.kind());
                continue;
            }
            Some(Err(e)) => {
                warn!("session {session}: read downstream: {e}");
                shutdown.trigger(TerminationCause::ClientRead(e.to_string()));
                return forwarded;
            }
        };

        let mut line = text.into_bytes();
        line.push(b'\n');

        let written = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return forwarded,
            written = write_line(remote, &line) => written,
        };

        if let Err(e) = written {
            warn!("session {session}: write upstream: {e}");
            shutdown.trigger(TerminationCause::ForwardWrite {
                direction: Direction::ToRemote,
                reason: e.to_string(),
            });
            return forwarded;
        }

        forwarded += 1;
        debug!("session {session}: client → remote line #{forwarded}");
    }
}

/// Writes one complete line and flushes it.
///
/// `write_all` keeps writing until every byte is accepted, even if the OS
/// takes a partial write first.
async fn write_line<W>(remote: &mut W, line: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    remote.write_all(line).await?;
    remote.flush().await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
