//! Websocket fan-out: each client subscribes to one room and receives that
//! room's events as JSON text frames. The socket is push-only; gameplay goes
//! through the HTTP API.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::broadcast::ChannelBroadcaster;

pub fn router(broadcaster: Arc<ChannelBroadcaster>) -> Router {
    Router::new()
        .route("/ws/{code}", get(ws_handler))
        .with_state(broadcaster)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(code): Path<String>,
    State(broadcaster): State<Arc<ChannelBroadcaster>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, code, broadcaster))
}

async fn handle_socket(socket: WebSocket, code: String, broadcaster: Arc<ChannelBroadcaster>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = broadcaster.subscribe();

    tracing::debug!(room = %code, "websocket client connected");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok((event_code, event)) if event_code == code => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(p) => p,
                            Err(e) => {
                                tracing::error!("failed to serialize room event: {e}");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {} // other room
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(room = %code, skipped, "websocket client lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound frames (pings included, axum answers those) are ignored
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!(room = %code, "websocket client disconnected");
}
