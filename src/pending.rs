//! Pending requests — one-shot reply handles keyed by nonce.
//!
//! DESIGN
//! ======
//! A request cycle is split into two halves built on `tokio::sync::oneshot`:
//! - [`PendingRequest`] sits in the [`PendingRegistry`] and is consumed by
//!   the router when the matching reply arrives.
//! - [`ReplyWaiter`] stays with the caller, who suspends on it.
//!
//! `fulfill` takes `self`, so a second fulfillment for the same nonce cannot
//! be expressed. Dropping a `PendingRequest` unfulfilled wakes its waiter
//! with [`PendingError::Abandoned`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use frames::Reply;
use tokio::sync::oneshot;

use crate::error::ClientError;

/// Terminal outcomes of a request cycle other than a delivered reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PendingError {
    /// The registry dropped the request without a reply.
    #[error("pending request abandoned")]
    Abandoned,
    /// The waiter's deadline passed first.
    #[error("pending request timed out")]
    TimedOut,
}

/// A reply that reached its [`PendingRequest`] after the waiter left.
/// Hands the reply back so it can be treated as unsolicited traffic.
#[derive(Debug, thiserror::Error)]
#[error("reply waiter for nonce {nonce} is gone")]
pub struct Undelivered {
    pub nonce: String,
    pub reply: Reply,
}

// =============================================================================
// PENDING REQUEST
// =============================================================================

/// Registry-side half of a request cycle.
#[derive(Debug)]
pub struct PendingRequest {
    nonce: String,
    tx: oneshot::Sender<Reply>,
}

/// Caller-side half of a request cycle.
#[derive(Debug)]
pub struct ReplyWaiter {
    nonce: String,
    rx: oneshot::Receiver<Reply>,
}

impl PendingRequest {
    /// Create a new cycle in the *pending* state.
    #[must_use]
    pub fn create(nonce: impl Into<String>) -> (Self, ReplyWaiter) {
        let nonce = nonce.into();
        let (tx, rx) = oneshot::channel();
        (Self { nonce: nonce.clone(), tx }, ReplyWaiter { nonce, rx })
    }

    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Deliver the reply and wake the waiter.
    ///
    /// # Errors
    ///
    /// Returns [`Undelivered`] carrying the reply if the waiter was dropped,
    /// e.g. after its deadline passed.
    pub fn fulfill(self, reply: Reply) -> Result<(), Undelivered> {
        let nonce = self.nonce;
        self.tx.send(reply).map_err(|reply| Undelivered { nonce, reply })
    }
}

impl ReplyWaiter {
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Suspend until the reply arrives.
    ///
    /// # Errors
    ///
    /// Returns [`PendingError::Abandoned`] if the registry side is dropped
    /// without a reply.
    pub async fn await_result(self) -> Result<Reply, PendingError> {
        self.rx.await.map_err(|_| PendingError::Abandoned)
    }

    /// Like [`Self::await_result`], bounded by `deadline` when one is given.
    ///
    /// # Errors
    ///
    /// Returns [`PendingError::TimedOut`] when the deadline passes first.
    pub async fn await_result_within(self, deadline: Option<Duration>) -> Result<Reply, PendingError> {
        let Some(deadline) = deadline else {
            return self.await_result().await;
        };
        tokio::time::timeout(deadline, self.await_result())
            .await
            .map_err(|_| PendingError::TimedOut)?
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Map of in-flight requests. Never locked across an await point.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    inner: Mutex<HashMap<String, PendingRequest>>,
}

impl PendingRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending request under its nonce.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::DuplicateNonce`] if the nonce is already in
    /// flight; the existing entry is left untouched.
    pub fn register(&self, pending: PendingRequest) -> Result<(), ClientError> {
        let mut inner = self.lock();
        if inner.contains_key(pending.nonce()) {
            return Err(ClientError::DuplicateNonce(pending.nonce.clone()));
        }
        inner.insert(pending.nonce.clone(), pending);
        Ok(())
    }

    /// Remove and return the entry for `nonce`.
    pub fn take(&self, nonce: &str) -> Option<PendingRequest> {
        self.lock().remove(nonce)
    }

    /// Drop the entry for `nonce`. Returns whether one was present.
    pub fn remove(&self, nonce: &str) -> bool {
        self.take(nonce).is_some()
    }

    #[must_use]
    pub fn contains(&self, nonce: &str) -> bool {
        self.lock().contains_key(nonce)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry, waking all waiters with [`PendingError::Abandoned`].
    /// Returns how many were outstanding.
    pub fn abandon_all(&self) -> usize {
        let drained: Vec<PendingRequest> = self.lock().drain().map(|(_, pending)| pending).collect();
        drained.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingRequest>> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "pending_test.rs"]
mod tests;
