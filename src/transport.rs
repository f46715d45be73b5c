//! Transport boundary and the WebSocket implementation.
//!
//! DESIGN
//! ======
//! Outbound traffic goes through the [`Transport`] trait so the client can be
//! driven by an in-memory transport in tests. Inbound traffic is not a
//! callback: the transport pushes [`TransportEvent`]s into an mpsc channel
//! that the client's router drains.
//!
//! LIFECYCLE
//! =========
//! 1. `connect` → handshake with `Origin` header → `Open` event
//! 2. Writer task: outbound channel → socket sink
//! 3. Reader task: socket stream → `Message` events
//! 4. Socket close, read error, or write error → `Close` event, then the
//!    event channel ends

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::TransportError;

/// Capacity of the inbound event and outbound text channels.
const CHANNEL_CAPACITY: usize = 256;

/// Notification pushed by a transport to the client's router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Message(String),
    Error(String),
    Close(Option<String>),
}

/// Outbound half of a connection. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Queue one text frame for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] once the connection is gone.
    async fn send(&self, text: String) -> Result<(), TransportError>;
}

// =============================================================================
// WEBSOCKET
// =============================================================================

/// WebSocket transport backed by `tokio-tungstenite`.
pub struct WsTransport {
    outbound: mpsc::Sender<String>,
}

impl WsTransport {
    /// Connect to the endpoint described by `config`.
    ///
    /// Returns the transport and the receiver of its inbound events.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidHeader`] for an unusable origin and
    /// [`TransportError::Connect`] when the handshake fails.
    pub async fn connect(config: &ClientConfig) -> Result<(Self, mpsc::Receiver<TransportEvent>), TransportError> {
        let url = config.endpoint_url();
        let mut request = url.as_str().into_client_request()?;
        request
            .headers_mut()
            .insert(ORIGIN, HeaderValue::from_str(&config.origin)?);

        let (stream, _) = connect_async(request).await?;
        info!(%url, "rpc: connected");

        let (sink, mut source) = stream.split();
        let (outbound_tx, outbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);

        // Receiver is still in hand, so this cannot fail.
        let _ = event_tx.send(TransportEvent::Open).await;

        tokio::spawn(write_frames(sink, outbound_rx, event_tx.clone()));

        tokio::spawn(async move {
            let reason = loop {
                let Some(message) = source.next().await else {
                    break None;
                };
                match message {
                    Ok(Message::Text(text)) => {
                        if event_tx.send(TransportEvent::Message(text.as_str().to_owned())).await.is_err() {
                            return;
                        }
                    }
                    Ok(Message::Close(frame)) => break frame.map(|f| f.reason.as_str().to_owned()),
                    Ok(_) => {}
                    Err(e) => {
                        let _ = event_tx.send(TransportEvent::Error(e.to_string())).await;
                        break Some(e.to_string());
                    }
                }
            };
            let _ = event_tx.send(TransportEvent::Close(reason)).await;
            debug!("rpc: reader task finished");
        });

        Ok((Self { outbound: outbound_tx }, event_rx))
    }
}

/// Drain queued text into `sink`. A failed write is reported as `Error`
/// followed by `Close`, so the router abandons requests whose frames were lost.
async fn write_frames<S>(mut sink: S, mut outbound: mpsc::Receiver<String>, events: mpsc::Sender<TransportEvent>)
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(text) = outbound.recv().await {
        if let Err(e) = sink.send(Message::Text(text.into())).await {
            let message = e.to_string();
            warn!(error = %message, "rpc: socket write failed");
            let _ = events.send(TransportEvent::Error(message.clone())).await;
            let _ = events.send(TransportEvent::Close(Some(message))).await;
            break;
        }
    }
    let _ = sink.close().await;
    debug!("rpc: writer task finished");
}

#[async_trait::async_trait]
impl Transport for WsTransport {
    async fn send(&self, text: String) -> Result<(), TransportError> {
        self.outbound.send(text).await.map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
