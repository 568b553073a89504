mod coach;
mod fellow;
pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, OUTBOUND_CAPACITY};
use crate::types::ConnectionId;

/// Decoded events waiting for the worker. A full queue stops reading the socket.
const INBOUND_CAPACITY: usize = 64;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection.
///
/// The socket is split three ways: this task reads frames, a worker task
/// handles decoded events strictly in arrival order, and a writer task drains
/// the connection's outbound queue. Deliveries from other connections go
/// straight to the outbound queue, so they are never held up by this
/// connection's in-flight work.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id: ConnectionId = ulid::Ulid::new().to_string();
    let (mut sender, mut receiver) = socket.split();

    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_CAPACITY);
    state.connect(conn_id.clone(), out_tx).await;
    tracing::info!("WebSocket connected: {}", conn_id);

    // Writer: ends once the registry drops this connection's sender
    let writer_id = conn_id.clone();
    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize message for {}: {}", writer_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                tracing::debug!("Socket for {} closed, stopping writer", writer_id);
                break;
            }
        }
    });

    // Worker: one event at a time, replies go back through the registry
    let (in_tx, mut in_rx) = mpsc::channel::<ClientMessage>(INBOUND_CAPACITY);
    let worker_state = state.clone();
    let worker_id = conn_id.clone();
    tokio::spawn(async move {
        while let Some(client_msg) = in_rx.recv().await {
            if let Some(reply) =
                handlers::handle_message(client_msg, &worker_id, &worker_state).await
            {
                if !worker_state.send_to(&worker_id, reply).await {
                    tracing::debug!("Reply for {} discarded, connection gone", worker_id);
                }
            }
        }
    });

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                tracing::debug!("Received message from {}: {}", conn_id, text.as_str());

                match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(client_msg) => {
                        if in_tx.send(client_msg).await.is_err() {
                            break;
                        }
                    }
                    // Malformed frames are dropped, never answered with an error
                    Err(e) => tracing::warn!("Ignoring malformed frame from {}: {}", conn_id, e),
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!("WebSocket closed by {}", conn_id);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("WebSocket error on {}: {}", conn_id, e);
                break;
            }
        }
    }

    drop(in_tx);
    state.disconnect(&conn_id).await;
    tracing::info!("WebSocket connection closed: {}", conn_id);
}
