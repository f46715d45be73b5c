use super::*;
use crate::client::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

type ServerStream = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

struct Handshake {
    uri: String,
    origin: Option<String>,
}

async fn loopback() -> (u16, TcpListener) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    (port, listener)
}

async fn accept(listener: TcpListener, seen: oneshot::Sender<Handshake>) -> ServerStream {
    let (stream, _) = listener.accept().await.expect("accept");
    let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        let origin = req
            .headers()
            .get(ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        let _ = seen.send(Handshake { uri: req.uri().to_string(), origin });
        Ok(resp)
    };
    tokio_tungstenite::accept_hdr_async(stream, callback)
        .await
        .expect("server handshake")
}

fn config(port: u16) -> ClientConfig {
    let mut config = ClientConfig::new(7).with_origin("https://app.example");
    config.port = port;
    config
}

async fn next_event(events: &mut mpsc::Receiver<TransportEvent>) -> TransportEvent {
    timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("event timed out")
        .expect("event channel closed")
}

#[tokio::test]
async fn connect_sends_origin_and_exchanges_text_frames() {
    let (port, listener) = loopback().await;
    let (seen_tx, seen_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let mut ws = accept(listener, seen_tx).await;
        while let Some(Ok(message)) = ws.next().await {
            if let Message::Text(text) = message {
                let echo = format!(r#"{{"echo":{}}}"#, text.as_str());
                ws.send(Message::Text(echo.into())).await.expect("server send");
                break;
            }
        }
        let _ = ws.close(None).await;
    });

    let (transport, mut events) = WsTransport::connect(&config(port)).await.expect("connect");
    assert_eq!(next_event(&mut events).await, TransportEvent::Open);

    let handshake = seen_rx.await.expect("handshake observed");
    assert!(handshake.uri.contains("client_id=7"));
    assert!(handshake.uri.contains("encoding=json"));
    assert_eq!(handshake.origin.as_deref(), Some("https://app.example"));

    transport.send(r#"{"cmd":"PING"}"#.to_owned()).await.expect("send");
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Message(r#"{"echo":{"cmd":"PING"}}"#.to_owned())
    );
    assert!(matches!(next_event(&mut events).await, TransportEvent::Close(_)));
    server.await.expect("server task");
}

#[tokio::test]
async fn failed_write_reports_error_then_close() {
    let sink = Box::pin(futures_util::sink::unfold((), |(), _message: Message| async {
        Err::<(), _>("connection reset")
    }));
    let (outbound_tx, outbound_rx) = mpsc::channel(4);
    let (event_tx, mut events) = mpsc::channel(4);
    let writer = tokio::spawn(write_frames(sink, outbound_rx, event_tx));

    outbound_tx.send(r#"{"cmd":"GET_GUILDS"}"#.to_owned()).await.expect("queue frame");
    assert_eq!(next_event(&mut events).await, TransportEvent::Error("connection reset".into()));
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Close(Some("connection reset".into()))
    );
    timeout(Duration::from_secs(2), writer)
        .await
        .expect("writer did not finish")
        .expect("writer task");
    assert!(outbound_tx.send("{}".to_owned()).await.is_err());
}

#[tokio::test]
async fn connect_to_closed_port_fails() {
    let (port, listener) = loopback().await;
    drop(listener);

    let err = WsTransport::connect(&config(port)).await.err().expect("connect should fail");
    assert!(matches!(err, TransportError::Connect(_)));
}

#[tokio::test]
async fn invalid_origin_is_rejected_before_connecting() {
    let cfg = ClientConfig::new(7).with_origin("bad\norigin");
    let err = WsTransport::connect(&cfg).await.err().expect("origin should fail");
    assert!(matches!(err, TransportError::InvalidHeader(_)));
}

#[tokio::test]
async fn client_round_trip_over_websocket() {
    let (port, listener) = loopback().await;
    let (seen_tx, _seen_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let mut ws = accept(listener, seen_tx).await;
        ws.send(Message::Text(r#"{"cmd":"DISPATCH","evt":"READY","data":{"v":1}}"#.to_owned().into()))
            .await
            .expect("ready");
        while let Some(Ok(message)) = ws.next().await {
            let Message::Text(text) = message else { continue };
            let frame: Value = serde_json::from_str(text.as_str()).expect("client frame");
            let reply = json!({
                "cmd": frame["cmd"],
                "nonce": frame["nonce"],
                "data": { "guilds": [{ "id": "1", "name": "loopback" }] }
            });
            ws.send(Message::Text(reply.to_string().into())).await.expect("reply");
            break;
        }
    });

    let client = Client::connect(config(port)).await.expect("client connect");
    let servers = timeout(Duration::from_secs(2), client.list_servers())
        .await
        .expect("request timed out")
        .expect("list servers");
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].name, "loopback");
    assert_eq!(client.last_payload(), Some(json!({ "v": 1 })));
    server.await.expect("server task");
}
