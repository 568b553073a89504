//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! The sender's role is checked here, then dispatched to role-specific
//! handler modules. Anything a sender is not entitled to do is dropped
//! without a reply.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::{ConnectionId, Role};
use std::sync::Arc;

use super::{coach, fellow};

/// Macro to check the sender's role and return early (silently) on mismatch
macro_rules! require_role {
    ($state:expr, $conn_id:expr, $role:expr, $action:expr) => {
        if $state.role_of($conn_id).await != Some($role) {
            tracing::debug!(
                "Dropping {} from {}: sender is not a {:?}",
                $action,
                $conn_id,
                $role
            );
            return None;
        }
    };
}

/// Handle one client event and return an optional reply for the sender
pub async fn handle_message(
    msg: ClientMessage,
    conn_id: &ConnectionId,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Registration
        ClientMessage::RegisterUser(payload) => {
            let name = payload.and_then(|p| p.name);
            fellow::handle_register_user(state, conn_id, name).await
        }

        ClientMessage::RegisterAdmin => coach::handle_register_admin(state, conn_id).await,

        // Fellow messages
        ClientMessage::UserMessage(text) => {
            require_role!(state, conn_id, Role::Fellow, "user-message");
            fellow::handle_user_message(state, conn_id, text).await
        }

        ClientMessage::UserAiMessage(text) => {
            require_role!(state, conn_id, Role::Fellow, "user-ai-message");
            fellow::handle_user_ai_message(state, conn_id, text).await
        }

        ClientMessage::GetAiHistory => {
            require_role!(state, conn_id, Role::Fellow, "get-ai-history");
            fellow::handle_get_ai_history(state, conn_id).await
        }

        // Coach messages
        ClientMessage::AdminMessage(payload) => {
            require_role!(state, conn_id, Role::Coach, "admin-message");
            coach::handle_admin_message(state, conn_id, payload).await
        }

        ClientMessage::GetHistory(user_id) => {
            require_role!(state, conn_id, Role::Coach, "get-history");
            coach::handle_get_history(state, user_id).await
        }
    }
}
