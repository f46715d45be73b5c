//! Request/reply correlation client for a local WebSocket RPC endpoint.
//!
//! SYSTEM CONTEXT
//! ==============
//! `client` issues commands and waits for their replies, `router` matches
//! inbound messages to waiters, `pending` holds the one-shot reply handles,
//! and `transport` owns the socket. The wire schema lives in the `frames`
//! crate.

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod pending;
pub mod router;
pub mod transport;
pub mod types;

pub use client::Client;
pub use command::Command;
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ErrorCode, TransportError};
pub use frames::{Frame, Reply};
pub use router::ClientEvent;
pub use transport::{Transport, TransportEvent, WsTransport};
