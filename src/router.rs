//! Inbound router — matches replies to pending requests.
//!
//! DESIGN
//! ======
//! The router owns no socket. It drains [`TransportEvent`]s from a channel
//! and, for each inbound message, either fulfills the pending request whose
//! nonce it carries or treats it as unsolicited traffic. Unsolicited payloads
//! are cached as the last-observed payload and broadcast to event listeners.
//! A reply whose waiter already gave up counts as unsolicited.
//!
//! ERROR HANDLING
//! ==============
//! A message that does not decode is a protocol violation. `on_message`
//! returns it as an error; the pump logs it and broadcasts it as
//! [`ClientEvent::ProtocolError`] instead of dropping it. Unmatched replies
//! are never errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use frames::Reply;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::error::ClientError;
use crate::pending::PendingRegistry;
use crate::transport::TransportEvent;

/// Outcome of routing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// The reply woke the waiter registered under `nonce`.
    Delivered { nonce: String },
    /// No waiter matched; the payload was cached and broadcast.
    Unmatched,
}

/// Connection-level notifications for listeners of [`crate::Client::events`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Open,
    /// An inbound message with no matching waiter.
    Dispatch(Reply),
    /// An inbound message that could not be decoded.
    ProtocolError(String),
    TransportError(String),
    Closed(Option<String>),
}

pub struct Router {
    pending: Arc<PendingRegistry>,
    last_payload: Mutex<Option<Value>>,
    events: broadcast::Sender<ClientEvent>,
    closed: AtomicBool,
}

impl Router {
    #[must_use]
    pub fn new(pending: Arc<PendingRegistry>, events: broadcast::Sender<ClientEvent>) -> Self {
        Self { pending, last_payload: Mutex::new(None), events, closed: AtomicBool::new(false) }
    }

    /// Route one inbound text message.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] when `raw` is not a valid reply.
    pub fn on_message(&self, raw: &str) -> Result<Routed, ClientError> {
        let reply = frames::decode_reply(raw)?;

        let pending = reply.nonce.as_deref().and_then(|nonce| self.pending.take(nonce));
        let reply = match pending {
            Some(pending) => {
                let nonce = pending.nonce().to_owned();
                match pending.fulfill(reply) {
                    Ok(()) => {
                        debug!(%nonce, "rpc: reply delivered");
                        return Ok(Routed::Delivered { nonce });
                    }
                    Err(undelivered) => {
                        debug!(%nonce, "rpc: reply arrived after waiter left");
                        undelivered.reply
                    }
                }
            }
            None => reply,
        };

        debug!(nonce = ?reply.nonce, evt = ?reply.evt, "rpc: unmatched message");
        self.record_payload(reply.data.clone());
        let _ = self.events.send(ClientEvent::Dispatch(reply));
        Ok(Routed::Unmatched)
    }

    /// Most recent payload of an unmatched message.
    #[must_use]
    pub fn last_payload(&self) -> Option<Value> {
        self.last_payload
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Mark the connection closed and abandon every outstanding request.
    pub fn close(&self, reason: Option<String>) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let abandoned = self.pending.abandon_all();
        info!(?reason, abandoned, "rpc: connection closed");
        let _ = self.events.send(ClientEvent::Closed(reason));
    }

    /// Handle one transport notification. Returns `false` once the
    /// connection is closed.
    pub fn handle_event(&self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::Open => {
                info!("rpc: connection open");
                let _ = self.events.send(ClientEvent::Open);
            }
            TransportEvent::Message(text) => {
                if let Err(e) = self.on_message(&text) {
                    error!(error = %e, "rpc: invalid inbound message");
                    let _ = self.events.send(ClientEvent::ProtocolError(e.to_string()));
                }
            }
            TransportEvent::Error(message) => {
                warn!(error = %message, "rpc: transport error");
                let _ = self.events.send(ClientEvent::TransportError(message));
            }
            TransportEvent::Close(reason) => {
                self.close(reason);
                return false;
            }
        }
        true
    }

    /// Drain transport events until the connection closes.
    pub async fn run(self: Arc<Self>, mut inbound: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = inbound.recv().await {
            if !self.handle_event(event) {
                return;
            }
        }
        self.close(None);
    }

    fn record_payload(&self, data: Value) {
        *self
            .last_payload
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(data);
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
