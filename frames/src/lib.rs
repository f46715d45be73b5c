//! Shared frame model and JSON text codec for the RPC socket.
//!
//! This crate owns the wire representation used by the `rpclink` client and
//! its CLI. Outbound requests are [`Frame`]s, inbound messages are
//! [`Reply`]s. Payloads stay flexible (`serde_json::Value`); each frame is a
//! single compact JSON document with no embedded newlines.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved `evt` value the peer uses to mark a failed command.
pub const ERROR_EVENT: &str = "ERROR";

/// Error returned by [`decode_reply`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw text is not a JSON document shaped like a [`Reply`].
    #[error("failed to decode reply: {0}")]
    Decode(#[from] serde_json::Error),
    /// The raw text is valid JSON but not a key/value document.
    #[error("reply is not a JSON object")]
    NotAnObject,
}

/// An outbound request on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Command name, e.g. `"GET_GUILDS"`.
    pub cmd: String,
    /// Command arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    /// Event name for subscription commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evt: Option<String>,
    /// Correlation id echoed back by the peer. Absent for fire-and-forget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl Frame {
    /// Build a frame with no arguments, event, or nonce.
    #[must_use]
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into(), args: None, evt: None, nonce: None }
    }

    #[must_use]
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = Some(args);
        self
    }

    #[must_use]
    pub fn with_event(mut self, evt: impl Into<String>) -> Self {
        self.evt = Some(evt.into());
        self
    }

    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

/// An inbound message: a reply to a request or an unsolicited event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Command this reply answers, when the peer echoes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    /// Correlation id of the originating request. Absent for events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Event marker. [`ERROR_EVENT`] flags a failed command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evt: Option<String>,
    /// Command-specific payload, or a diagnostic document on error.
    #[serde(default)]
    pub data: Value,
}

impl Reply {
    /// True when the peer marked this reply as a failed command.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.evt.as_deref() == Some(ERROR_EVENT)
    }

    /// Human-readable diagnostic for an error reply.
    ///
    /// Prefers `data.message`, falls back to a bare string payload, and
    /// finally to the compact JSON rendering of `data`.
    #[must_use]
    pub fn error_message(&self) -> String {
        match &self.data {
            Value::String(text) => text.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| self.data.to_string(), ToOwned::to_owned),
            other => other.to_string(),
        }
    }
}

/// Encode a frame as a single line of JSON text.
#[must_use]
pub fn encode_frame(frame: &Frame) -> String {
    // Serializing string keys and `Value`s cannot fail.
    serde_json::to_string(frame).unwrap_or_default()
}

/// Decode one inbound text message.
///
/// # Errors
///
/// Returns [`CodecError::NotAnObject`] for any JSON value other than an
/// object, and [`CodecError::Decode`] for malformed text or wrongly typed
/// fields.
pub fn decode_reply(text: &str) -> Result<Reply, CodecError> {
    // Derived struct deserializers also accept sequences; check the shape first.
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(CodecError::NotAnObject);
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
