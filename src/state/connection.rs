use super::{AppState, Outbound};
use crate::broadcast::publish_roster;
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    /// Track a new transport connection
    pub async fn connect(&self, id: ConnectionId, outbound: Outbound) {
        self.registry.write().await.connect(id, outbound);
    }

    /// Tear down a connection. Fellows leaving the roster trigger a republish.
    pub async fn disconnect(&self, id: &ConnectionId) -> Option<Role> {
        let role = self.registry.write().await.unregister(id);

        match role {
            Some(Role::Fellow) => {
                tracing::info!("Fellow {} disconnected", id);
                publish_roster(self).await;
            }
            Some(Role::Coach) => tracing::info!("Coach {} disconnected", id),
            None => tracing::debug!("Unregistered connection {} closed", id),
        }
        role
    }

    pub async fn role_of(&self, id: &ConnectionId) -> Option<Role> {
        self.registry.read().await.role_of(id)
    }

    /// Unicast to one connection. Returns false if it is gone.
    pub async fn send_to(&self, id: &ConnectionId, msg: ServerMessage) -> bool {
        self.registry.read().await.send_to(id, msg)
    }
}
