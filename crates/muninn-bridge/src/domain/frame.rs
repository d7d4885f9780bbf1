//! Transport-neutral WebSocket frame.
//!
//! The pumps in the application layer never see an `axum` or `tungstenite`
//! message type directly; the infrastructure layer converts to and from
//! [`Frame`] at the socket boundary.

/// One discrete message on the browser-facing connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text payload.  The only kind that is forwarded to the remote side.
    Text(String),
    /// Opaque binary payload.
    Binary(Vec<u8>),
    /// Protocol-level ping.
    Ping(Vec<u8>),
    /// Protocol-level pong.
    Pong(Vec<u8>),
    /// The peer started the closing handshake.
    Close,
}

impl Frame {
    /// Short name of the frame kind, for log lines.
    ///
    /// Payloads are never included so that logs do not leak typed commands
    /// (passwords are commonly typed into line-oriented servers).
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Text(_) => "text",
            Frame::Binary(_) => "binary",
            Frame::Ping(_) => "ping",
            Frame::Pong(_) => "pong",
            Frame::Close => "close",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(Frame::Text("x".into()).kind(), "text");
        assert_eq!(Frame::Binary(vec![1]).kind(), "binary");
        assert_eq!(Frame::Ping(vec![]).kind(), "ping");
        assert_eq!(Frame::Pong(vec![]).kind(), "pong");
        assert_eq!(Frame::Close.kind(), "close");
    }

    #[test]
    fn test_kind_does_not_expose_payload() {
        let frame = Frame::Text("hunter2".into());
        assert!(!frame.kind().contains("hunter2"));
    }
}
