use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::server::ReliefServer;

/// Handle WebSocket upgrade. Each connection gets its own fanout
/// subscription and receives every change event from that moment on;
/// there is no replay of earlier events.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(server): State<ReliefServer>,
) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, server))
}

async fn handle_connection(socket: WebSocket, server: ReliefServer) {
    let connection_id = format!("ws_{}", Uuid::new_v4());
    let mut subscription = server.fanout.subscribe();
    let (mut sender, mut receiver) = socket.split();

    info!(connection_id = %connection_id, "WebSocket connection opened");

    let welcome = json!({
        "status": "connected",
        "connection_id": connection_id,
        "server": server.config.name,
        "version": env!("CARGO_PKG_VERSION"),
    });
    if sender.send(Message::Text(welcome.to_string())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = subscription.recv() => match event {
                Some(event) => {
                    let Ok(text) = serde_json::to_string(&event) else { continue };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                // Fanout shut down
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Ping(payload))) => {
                    if sender.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(other)) => {
                    debug!(connection_id = %connection_id, "Ignoring client message: {other:?}");
                }
            },
        }
    }

    info!(connection_id = %connection_id, "WebSocket connection closed");
}
