//! Error types for the request path and the inbound router.
//!
//! DESIGN
//! ======
//! One `thiserror` enum per layer: [`TransportError`] for the socket,
//! [`ClientError`] for everything a request method can return. Every error
//! carries a stable grep-able code through [`ErrorCode`].

use serde_json::Value;

/// Grepable error code and retryable flag.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Failures raised by a [`crate::transport::Transport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The WebSocket handshake failed.
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),

    /// The configured origin cannot be used as an HTTP header value.
    #[error("invalid origin header: {0}")]
    InvalidHeader(#[from] tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue),

    /// The connection is gone; nothing more can be sent.
    #[error("connection closed")]
    Closed,
}

impl ErrorCode for TransportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Connect(_) => "E_CONNECT",
            Self::InvalidHeader(_) => "E_INVALID_HEADER",
            Self::Closed => "E_CONNECTION_CLOSED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Closed)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Connect(Box::new(error))
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Errors returned by [`crate::client::Client`] request methods.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The peer answered with the reserved error event.
    #[error("remote error for {command}: {message}")]
    Remote { command: String, message: String, data: Value },

    /// An inbound message was not a valid reply document.
    #[error(transparent)]
    Decode(#[from] frames::CodecError),

    /// Sending the request failed.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// No reply arrived before the request deadline.
    #[error("timed out waiting for {command} reply (nonce {nonce})")]
    Timeout { command: String, nonce: String },

    /// The connection closed while the request was outstanding.
    #[error("connection closed before reply arrived")]
    Closed,

    /// A correlation id was registered twice.
    #[error("nonce {0} is already pending")]
    DuplicateNonce(String),

    /// The reply payload did not match the command's result shape.
    #[error("unexpected {command} payload: {source}")]
    UnexpectedPayload {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ErrorCode for ClientError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Remote { .. } => "E_REMOTE",
            Self::Decode(_) => "E_DECODE",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Timeout { .. } => "E_TIMEOUT",
            Self::Closed => "E_CLOSED",
            Self::DuplicateNonce(_) => "E_DUPLICATE_NONCE",
            Self::UnexpectedPayload { .. } => "E_UNEXPECTED_PAYLOAD",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.retryable(),
            Self::Timeout { .. } | Self::Closed => true,
            _ => false,
        }
    }
}

impl ClientError {
    /// Diagnostic payload of a remote error, if this is one.
    #[must_use]
    pub fn remote_data(&self) -> Option<&Value> {
        match self {
            Self::Remote { data, .. } => Some(data),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
