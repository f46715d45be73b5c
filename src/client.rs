//! RPC client — request/reply correlation over one connection.
//!
//! ARCHITECTURE
//! ============
//! Every request method funnels into [`Client::request`]:
//! 1. Generate a UUID v4 nonce
//! 2. Register a [`PendingRequest`] under it
//! 3. Send the encoded frame through the [`Transport`]
//! 4. Suspend on the [`ReplyWaiter`](crate::pending::ReplyWaiter), bounded by the request timeout
//! 5. Drop the registry entry, whatever the outcome
//! 6. Map an `ERROR` reply to [`ClientError::Remote`]
//!
//! Inbound traffic is handled by a [`Router`] running on its own task. The
//! registry is the only state shared between callers and that task.
//!
//! Registration precedes the send so a fast reply always finds its waiter.

use std::sync::Arc;

use frames::Reply;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::command::Command;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::pending::{PendingError, PendingRegistry, PendingRequest};
use crate::router::{ClientEvent, Router};
use crate::transport::{Transport, TransportEvent, WsTransport};
use crate::types::{Authentication, Authorization, Channel, Server, ServerList, Subscription};

const EVENT_CAPACITY: usize = 64;

pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    pending: Arc<PendingRegistry>,
    router: Arc<Router>,
    events: broadcast::Sender<ClientEvent>,
    pump: JoinHandle<()>,
}

impl Client {
    /// Open a WebSocket connection and start routing its traffic.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the connection cannot be made.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let (transport, inbound) = WsTransport::connect(&config).await?;
        Ok(Self::with_transport(config, Arc::new(transport), inbound))
    }

    /// Build a client over an existing transport and its inbound events.
    ///
    /// Must be called from within a tokio runtime; the router task is
    /// spawned here.
    #[must_use]
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        inbound: mpsc::Receiver<TransportEvent>,
    ) -> Self {
        let pending = Arc::new(PendingRegistry::new());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let router = Arc::new(Router::new(pending.clone(), events.clone()));
        let pump = tokio::spawn(router.clone().run(inbound));
        Self { config, transport, pending, router, events, pump }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Subscribe to unsolicited traffic and connection notifications.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Payload of the most recent message that matched no request.
    #[must_use]
    pub fn last_payload(&self) -> Option<Value> {
        self.router.last_payload()
    }

    /// Number of requests still waiting for a reply.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.router.is_closed()
    }

    // =========================================================================
    // SEND AND WAIT
    // =========================================================================

    /// Send `command` and wait for its reply.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Transport`] if the frame could not be sent
    /// - [`ClientError::Timeout`] if no reply arrived before the deadline
    /// - [`ClientError::Closed`] if the connection closed first
    /// - [`ClientError::Remote`] if the peer replied with an error event
    pub async fn request(&self, command: &Command) -> Result<Reply, ClientError> {
        let nonce = Uuid::new_v4().to_string();
        let frame = command.to_frame(&nonce);
        let cmd = command.name();

        let (pending, waiter) = PendingRequest::create(nonce.clone());
        self.pending.register(pending)?;
        if self.router.is_closed() {
            self.pending.remove(&nonce);
            return Err(ClientError::Closed);
        }

        if let Err(e) = self.transport.send(frames::encode_frame(&frame)).await {
            self.pending.remove(&nonce);
            warn!(cmd, %nonce, error = %e, "rpc: send failed");
            return Err(e.into());
        }
        debug!(cmd, %nonce, "rpc: request sent");

        let outcome = waiter.await_result_within(self.config.request_timeout).await;
        self.pending.remove(&nonce);

        let reply = match outcome {
            Ok(reply) => reply,
            Err(PendingError::TimedOut) => {
                warn!(cmd, %nonce, "rpc: request timed out");
                return Err(ClientError::Timeout { command: cmd.to_owned(), nonce });
            }
            Err(PendingError::Abandoned) => return Err(ClientError::Closed),
        };

        if reply.is_error() {
            let message = reply.error_message();
            warn!(cmd, %nonce, %message, "rpc: remote error");
            return Err(ClientError::Remote { command: cmd.to_owned(), message, data: reply.data });
        }

        debug!(cmd, %nonce, "rpc: reply received");
        Ok(reply)
    }

    /// Send `command` without a nonce and without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the frame could not be sent.
    pub async fn notify(&self, command: &Command) -> Result<(), ClientError> {
        let frame = command.to_notification();
        self.transport.send(frames::encode_frame(&frame)).await?;
        debug!(cmd = command.name(), "rpc: notification sent");
        Ok(())
    }

    async fn request_as<T: DeserializeOwned>(&self, command: Command) -> Result<T, ClientError> {
        let reply = self.request(&command).await?;
        serde_json::from_value(reply.data).map_err(|source| ClientError::UnexpectedPayload {
            command: command.name().to_owned(),
            source,
        })
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Ask the user to authorize this application for `scopes`.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn authorize(&self, scopes: &[&str]) -> Result<Authorization, ClientError> {
        let scopes = scopes.iter().map(|s| (*s).to_owned()).collect();
        self.request_as(Command::Authorize { client_id: self.config.client_id, scopes })
            .await
    }

    /// Authenticate the connection with an OAuth2 access token.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn authenticate(&self, access_token: &str) -> Result<Authentication, ClientError> {
        self.request_as(Command::Authenticate { access_token: access_token.to_owned() })
            .await
    }

    /// Select a text channel. `None` when the peer reports no channel.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn select_text_channel(&self, channel_id: u64) -> Result<Option<Channel>, ClientError> {
        self.request_as(Command::SelectTextChannel { channel_id }).await
    }

    /// Select a voice channel. `None` when the peer reports no channel.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn select_voice_channel(&self, channel_id: u64) -> Result<Option<Channel>, ClientError> {
        self.request_as(Command::SelectVoiceChannel { channel_id }).await
    }

    /// List the servers the authenticated user belongs to.
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn list_servers(&self) -> Result<Vec<Server>, ClientError> {
        let list: ServerList = self.request_as(Command::GetGuilds).await?;
        Ok(list.guilds)
    }

    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn get_server(&self, server_id: u64) -> Result<Server, ClientError> {
        self.request_as(Command::GetGuild { guild_id: server_id }).await
    }

    /// Subscribe to `event`; matching events arrive on [`Client::events`].
    ///
    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn subscribe(&self, event: &str, args: Option<Value>) -> Result<Subscription, ClientError> {
        self.request_as(Command::Subscribe { event: event.to_owned(), args }).await
    }

    /// # Errors
    ///
    /// See [`Client::request`].
    pub async fn unsubscribe(&self, event: &str, args: Option<Value>) -> Result<Subscription, ClientError> {
        self.request_as(Command::Unsubscribe { event: event.to_owned(), args }).await
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
