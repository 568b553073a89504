//! Coach message handlers
//!
//! Handlers for the admin side: joining the coach group, messaging a single
//! fellow, and reading a fellow's coach thread.

use crate::protocol::{AdminMessagePayload, ServerMessage};
use crate::state::AppState;
use crate::types::{ConnectionId, Origin};
use std::sync::Arc;

pub async fn handle_register_admin(
    state: &Arc<AppState>,
    conn_id: &ConnectionId,
) -> Option<ServerMessage> {
    // The registry unicasts the roster snapshot itself
    match state.registry.write().await.register_coach(conn_id) {
        Ok(()) => tracing::info!("Coach registered: {}", conn_id),
        Err(e) => tracing::warn!("Ignoring register-admin: {}", e),
    }
    None
}

/// Deliver a coach message to one fellow. The returned copy is the sender's
/// acknowledgment. Targets that are gone are dropped without a reply.
pub async fn handle_admin_message(
    state: &Arc<AppState>,
    conn_id: &ConnectionId,
    payload: AdminMessagePayload,
) -> Option<ServerMessage> {
    let (Some(target), Some(text)) = (payload.user_id, payload.text) else {
        tracing::debug!("Dropping admin-message from {} with missing fields", conn_id);
        return None;
    };
    if text.trim().is_empty() {
        return None;
    }

    let mut registry = state.registry.write().await;
    let Some(msg) = registry.append_coach_message(&target, Origin::Admin, text) else {
        tracing::debug!("Dropping admin-message for unknown fellow {}", target);
        return None;
    };

    let reply = ServerMessage::NewMessage(msg);
    if !registry.send_to(&target, reply.clone()) {
        tracing::debug!("Fellow {} closed before delivery", target);
    }
    Some(reply)
}

pub async fn handle_get_history(
    state: &Arc<AppState>,
    user_id: ConnectionId,
) -> Option<ServerMessage> {
    let registry = state.registry.read().await;
    if registry.lookup(&user_id)?.fellow().is_none() {
        return None;
    }

    let messages = registry.coach_history(&user_id);
    Some(ServerMessage::History { user_id, messages })
}
