//! Fellow message handlers
//!
//! Handlers for fellow-specific events: registration, messages to the coach,
//! and the assistant thread.

use crate::assistant;
use crate::broadcast::publish_roster;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{ConnectionId, Origin};
use std::sync::Arc;

pub async fn handle_register_user(
    state: &Arc<AppState>,
    conn_id: &ConnectionId,
    name: Option<String>,
) -> Option<ServerMessage> {
    let result = state
        .registry
        .write()
        .await
        .register_fellow(conn_id, name.as_deref());

    match result {
        Ok(name) => {
            tracing::info!("Fellow registered: {} ({})", name, conn_id);
            publish_roster(state).await;
            Some(ServerMessage::Registered {
                id: conn_id.clone(),
                name,
            })
        }
        Err(e) => {
            tracing::warn!("Ignoring register-user: {}", e);
            None
        }
    }
}

/// Record the message on the fellow's coach thread and fan it out to the
/// coach group. Both happen under one lock so coaches see messages in log order.
pub async fn handle_user_message(
    state: &Arc<AppState>,
    conn_id: &ConnectionId,
    text: String,
) -> Option<ServerMessage> {
    if text.trim().is_empty() {
        tracing::debug!("Dropping empty user-message from {}", conn_id);
        return None;
    }

    let mut registry = state.registry.write().await;
    let msg = registry.append_coach_message(conn_id, Origin::User, text)?;
    let delivered = registry.broadcast_to_coaches(ServerMessage::NewMessage(msg));
    tracing::debug!("Fellow {} message delivered to {} coaches", conn_id, delivered);
    None
}

pub async fn handle_user_ai_message(
    state: &Arc<AppState>,
    conn_id: &ConnectionId,
    text: String,
) -> Option<ServerMessage> {
    if text.trim().is_empty() {
        tracing::debug!("Dropping empty user-ai-message from {}", conn_id);
        return None;
    }

    tracing::info!(
        "Assistant query from {}: {}",
        conn_id,
        text.chars().take(50).collect::<String>()
    );
    assistant::handle_user_query(state, conn_id, text).await
}

pub async fn handle_get_ai_history(
    state: &Arc<AppState>,
    conn_id: &ConnectionId,
) -> Option<ServerMessage> {
    assistant::handle_history_request(state, conn_id).await
}
