//! services/gateway/src/web/ws_handler.rs
//!
//! This is the main entry point and receive loop for a WebSocket connection.
//! Every text frame is dispatched on its own task, so requests from one
//! connection run concurrently and their replies may arrive in any order.

use crate::web::{dispatcher::dispatch, protocol::ServerMessage, state::AppState};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    info!(%connection_id, "New WebSocket connection established");

    // The sender is shared by every in-flight request on this connection.
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let app_state = app_state.clone();
                let ws_sender = ws_sender.clone();
                tokio::spawn(async move {
                    let reply = dispatch(&app_state, text.as_str()).await;
                    send_reply(&ws_sender, &reply, connection_id).await;
                });
            }
            Ok(Message::Binary(_)) => {
                warn!(%connection_id, "Binary frame received, expected JSON text");
                let reply = ServerMessage::Error {
                    message: "Binary frames are not supported".to_string(),
                };
                send_reply(&ws_sender, &reply, connection_id).await;
            }
            Ok(Message::Close(_)) => {
                info!(%connection_id, "Client sent close message.");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(%connection_id, error = %e, "WebSocket receive failed");
                break;
            }
        }
    }

    // Requests still in flight finish on their own; their replies are dropped.
    info!(%connection_id, "WebSocket connection closed.");
}

async fn send_reply(ws_sender: &WsSender, reply: &ServerMessage, connection_id: Uuid) {
    let json = match serde_json::to_string(reply) {
        Ok(json) => json,
        Err(e) => {
            error!(%connection_id, error = %e, "Failed to serialize reply");
            return;
        }
    };
    if ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_err()
    {
        debug!(%connection_id, "Client went away before the reply was sent");
    }
}
