//! HTTP server: routing, origin check, dial, and WebSocket upgrade.
//!
//! # Routes
//!
//! | Route                               | Remote dialled                     |
//! |-------------------------------------|------------------------------------|
//! | `GET /connect/{address}`            | `address` (`host:port`)            |
//! | `GET /connect`                      | `bridge.target` from configuration |
//! | `GET /api/connect[/{address}]`      | same as above                      |
//!
//! # Order of operations for one request
//!
//! 1. Origin policy check → `403 Forbidden` on rejection (nothing dialled).
//! 2. Dial the remote server → `502 Bad Gateway` on failure (no upgrade).
//! 3. WebSocket upgrade.  If the request is not a valid upgrade the remote
//!    connection is dropped and axum's rejection is returned.
//! 4. In the upgraded connection's task, [`Session::run`] bridges the two.
//!
//! Dialling before upgrading means a failed dial can still be reported with
//! a proper HTTP status; once the handshake is done the only way to signal
//! failure to the browser is closing the socket.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::{future, SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::{Session, ShutdownSignal};
use crate::domain::{BridgeConfig, Frame, SessionId, SessionLifecycle, SessionState};
use crate::infrastructure::connector::TcpConnector;

/// Body of the 502 response sent when the remote server cannot be reached.
pub const DIAL_FAILED_BODY: &str = "error connecting to address";

/// Body of the 403 response sent when the origin policy rejects a request.
pub const ORIGIN_REJECTED_BODY: &str = "origin not allowed";

/// Body of the 404 response for `GET /connect` without a configured target.
pub const NO_DEFAULT_TARGET_BODY: &str = "no default target configured";

// ── Shared state ──────────────────────────────────────────────────────────────

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    config: Arc<BridgeConfig>,
    connector: TcpConnector,
    /// Server-wide shutdown; each session's signal is a child of it.
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: BridgeConfig, shutdown: CancellationToken) -> Self {
        Self {
            connector: TcpConnector::new(config.dial_timeout),
            config: Arc::new(config),
            shutdown,
        }
    }
}

/// Builds the router with the bridge routes mounted at `/` and `/api`.
pub fn build_router(state: AppState) -> Router {
    let connect: Router<AppState> = Router::new()
        .route("/connect", get(connect_default))
        .route("/connect/{address}", get(connect_address));

    Router::new()
        .merge(connect.clone())
        .nest("/api", connect)
        .with_state(state)
}

// ── Server ────────────────────────────────────────────────────────────────────

/// A bound, not yet running, HTTP server.
///
/// Binding and running are separate steps so callers (and tests) can learn
/// the actual port when binding to port 0.
pub struct Server {
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
}

impl Server {
    /// Binds `config.bind_addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound (port in use,
    /// missing permission, ...).
    pub async fn bind(config: BridgeConfig, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("failed to bind HTTP listener on {}", config.bind_addr))?;

        info!(
            "origin policy: {}; default target: {}",
            config.origin_policy.label(),
            config.default_target.as_deref().unwrap_or("none")
        );

        let router = build_router(AppState::new(config, shutdown.clone()));
        Ok(Self {
            listener,
            router,
            shutdown,
        })
    }

    /// The address actually bound.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS cannot report the socket address.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("failed to read listener address")
    }

    /// Serves requests until the shutdown token is cancelled.
    ///
    /// Cancelling the token also ends every bridged session.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept loop fails.
    pub async fn run(self) -> anyhow::Result<()> {
        let Server {
            listener,
            router,
            shutdown,
        } = self;

        if let Ok(addr) = listener.local_addr() {
            info!("bridge listening on http://{addr}");
        }

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server failed")
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /connect/{address}`
async fn connect_address(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    bridge(state, address, peer, &headers, ws).await
}

/// `GET /connect`: uses the configured default target.
async fn connect_default(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(address) = state.config.default_target.clone() else {
        debug!("{peer}: GET /connect without a configured target");
        return (StatusCode::NOT_FOUND, NO_DEFAULT_TARGET_BODY).into_response();
    };
    bridge(state, address, peer, &headers, ws).await
}

/// Origin check, dial, upgrade.  See the module docs for the ordering.
async fn bridge(
    state: AppState,
    address: String,
    peer: SocketAddr,
    headers: &HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let id = SessionId::new();

    let origin = header_str(headers, header::ORIGIN);
    let host = header_str(headers, header::HOST);
    if !state.config.origin_policy.permits(origin, host) {
        warn!(
            "session {id}: origin {} from {peer} rejected by {} policy",
            origin.unwrap_or("-"),
            state.config.origin_policy.label()
        );
        return (StatusCode::FORBIDDEN, ORIGIN_REJECTED_BODY).into_response();
    }

    info!("session {id}: {peer} requested bridge to {address}");

    // ── Connecting ────────────────────────────────────────────────────────────
    let mut lifecycle = SessionLifecycle::new();
    let upstream = match state.connector.connect(&address).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("session {id}: error connecting to address: {e}");
            close_unbridged(&mut lifecycle, id);
            return (StatusCode::BAD_GATEWAY, DIAL_FAILED_BODY).into_response();
        }
    };

    // ── Upgrading ─────────────────────────────────────────────────────────────
    if let Err(e) = lifecycle.advance(SessionState::Upgrading) {
        error!("session {id}: {e}");
    }
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!("session {id}: upgrade: {rejection}");
            // Close the remote connection we opened for nothing.
            drop(upstream);
            close_unbridged(&mut lifecycle, id);
            return rejection.into_response();
        }
    };

    let shutdown = ShutdownSignal::child_of(&state.shutdown);
    let session = Session::new(id, address, upstream, lifecycle, shutdown, &state.config);

    // If the handshake fails after the 101 response, `session` (and with it
    // the remote connection) is dropped without ever running.
    ws.on_failed_upgrade(move |e| warn!("session {id}: upgrade: {e}"))
        .on_upgrade(move |socket| serve_socket(session, socket))
}

/// Walks a session that never started bridging through `Closing` to `Closed`.
fn close_unbridged(lifecycle: &mut SessionLifecycle, id: SessionId) {
    for next in [SessionState::Closing, SessionState::Closed] {
        if let Err(e) = lifecycle.advance(next) {
            error!("session {id}: {e}");
        }
    }
}

/// Runs a session over an upgraded WebSocket.
async fn serve_socket(session: Session<TcpStream>, socket: WebSocket) {
    debug!("session {}: upgraded", session.id());
    let (sink, stream) = socket.split();
    let frames_out = sink.with(|frame: Frame| future::ready(Ok::<_, axum::Error>(to_message(frame))));
    let frames_in = stream.map(|item| item.map(to_frame));
    session.run(frames_out, frames_in).await;
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

// ── Frame conversion ──────────────────────────────────────────────────────────

/// axum message → transport-neutral frame.
fn to_frame(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text.as_str().to_owned()),
        Message::Binary(data) => Frame::Binary(data.to_vec()),
        Message::Ping(data) => Frame::Ping(data.to_vec()),
        Message::Pong(data) => Frame::Pong(data.to_vec()),
        Message::Close(_) => Frame::Close,
    }
}

/// Transport-neutral frame → axum message.
fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(data) => Message::Binary(data.into()),
        Frame::Ping(data) => Message::Ping(data.into()),
        Frame::Pong(data) => Message::Pong(data.into()),
        Frame::Close => Message::Close(None),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_conversion_preserves_payload() {
        let frame = to_frame(to_message(Frame::Text("look north".into())));
        assert_eq!(frame, Frame::Text("look north".into()));
    }

    #[test]
    fn test_close_message_becomes_close_frame() {
        assert_eq!(to_frame(Message::Close(None)), Frame::Close);
    }

    #[test]
    fn test_binary_message_becomes_binary_frame() {
        let frame = to_frame(Message::Binary(vec![1u8, 2, 3].into()));
        assert_eq!(frame, Frame::Binary(vec![1, 2, 3]));
    }

    #[test]
    fn test_failed_dial_closes_lifecycle() {
        // Arrange: the dial failed, so the lifecycle never left Connecting
        let mut lifecycle = SessionLifecycle::new();

        // Act
        close_unbridged(&mut lifecycle, SessionId::new());

        // Assert
        assert_eq!(lifecycle.state(), SessionState::Closed);
    }

    #[test]
    fn test_rejected_upgrade_closes_lifecycle() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.advance(SessionState::Upgrading).unwrap();

        close_unbridged(&mut lifecycle, SessionId::new());

        assert_eq!(lifecycle.state(), SessionState::Closed);
    }

    #[test]
    fn test_header_str_ignores_non_ascii_values() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, "http://ok.example".parse().unwrap());
        assert_eq!(header_str(&headers, header::ORIGIN), Some("http://ok.example"));
        assert_eq!(header_str(&headers, header::HOST), None);
    }
}
