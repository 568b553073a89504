use crate::protocol::ServerMessage;
use crate::state::AppState;

/// Recompute the roster and push it to every coach connection.
///
/// Called whenever fellow membership changes. Returns the number of coach
/// connections that accepted the update.
pub async fn publish_roster(state: &AppState) -> usize {
    let registry = state.registry.read().await;
    let roster = registry.roster();
    let fellows = roster.len();

    // No coaches connected is fine
    let delivered = registry.broadcast_to_coaches(ServerMessage::UserList(roster));
    tracing::debug!(
        "Published roster of {} fellows to {} coaches",
        fellows,
        delivered
    );
    delivered
}
