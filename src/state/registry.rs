//! Connection registry
//!
//! Tracks every live connection, the role it registered as, and the explicit
//! coach group used for fan-out. Everything here is synchronous; callers hold
//! the `AppState` lock for the duration of one step.

use crate::protocol::ServerMessage;
use crate::types::*;
use rand::Rng;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::mpsc;

/// Sending half of a connection's outbound queue
pub type Outbound = mpsc::Sender<ServerMessage>;

/// Messages a connection may have queued before further deliveries are dropped
pub const OUTBOUND_CAPACITY: usize = 256;

/// Longest display name we keep (in characters)
pub const MAX_NAME_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("connection {0} is not connected")]
    UnknownConnection(ConnectionId),

    #[error("connection {id} is already registered as {role:?}")]
    RoleConflict { id: ConnectionId, role: Role },
}

/// Per-fellow state. Both logs live and die with the registration.
#[derive(Debug, Clone)]
pub struct Fellow {
    pub name: String,
    pub(super) coach_log: Vec<CoachMessage>,
    pub(super) assistant_log: Vec<AssistantMessage>,
    /// Registration order, used to sort the roster
    joined_seq: u64,
}

#[derive(Debug, Clone)]
enum ConnectionRole {
    Pending,
    Fellow(Fellow),
    Coach,
}

/// A live transport connection
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    role: ConnectionRole,
    outbound: Outbound,
}

impl Connection {
    pub fn role(&self) -> Option<Role> {
        match self.role {
            ConnectionRole::Pending => None,
            ConnectionRole::Fellow(_) => Some(Role::Fellow),
            ConnectionRole::Coach => Some(Role::Coach),
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.fellow().map(|f| f.name.as_str())
    }

    pub fn fellow(&self) -> Option<&Fellow> {
        match &self.role {
            ConnectionRole::Fellow(fellow) => Some(fellow),
            _ => None,
        }
    }

    pub(super) fn fellow_mut(&mut self) -> Option<&mut Fellow> {
        match &mut self.role {
            ConnectionRole::Fellow(fellow) => Some(fellow),
            _ => None,
        }
    }

    /// Queue a message for this connection. Returns false if the socket side
    /// has already gone away or is too far behind to take more.
    pub fn send(&self, msg: ServerMessage) -> bool {
        match self.outbound.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Outbound queue for {} is full, dropping message", self.id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<ConnectionId, Connection>,
    coaches: BTreeSet<ConnectionId>,
    next_seq: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly upgraded connection. It holds no role until it registers.
    pub fn connect(&mut self, id: ConnectionId, outbound: Outbound) {
        self.connections.insert(
            id.clone(),
            Connection {
                id,
                role: ConnectionRole::Pending,
                outbound,
            },
        );
    }

    /// Promote a connection to fellow and return the display name it got.
    ///
    /// Registering again as a fellow resets the connection: the new name
    /// replaces the old one and both logs start empty.
    pub fn register_fellow(
        &mut self,
        id: &ConnectionId,
        requested_name: Option<&str>,
    ) -> Result<String, RegistryError> {
        let seq = self.next_seq;
        let conn = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownConnection(id.clone()))?;

        let joined_seq = match &conn.role {
            ConnectionRole::Coach => {
                return Err(RegistryError::RoleConflict {
                    id: id.clone(),
                    role: Role::Coach,
                })
            }
            ConnectionRole::Fellow(previous) => {
                tracing::info!("Fellow {} registered again, resetting logs", id);
                previous.joined_seq
            }
            ConnectionRole::Pending => {
                self.next_seq += 1;
                seq
            }
        };

        let name = normalize_name(requested_name).unwrap_or_else(fallback_name);
        conn.role = ConnectionRole::Fellow(Fellow {
            name: name.clone(),
            coach_log: Vec::new(),
            assistant_log: Vec::new(),
            joined_seq,
        });
        Ok(name)
    }

    /// Add a connection to the coach group and hand it the current roster.
    pub fn register_coach(&mut self, id: &ConnectionId) -> Result<(), RegistryError> {
        let conn = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownConnection(id.clone()))?;

        if let ConnectionRole::Fellow(_) = conn.role {
            return Err(RegistryError::RoleConflict {
                id: id.clone(),
                role: Role::Fellow,
            });
        }
        conn.role = ConnectionRole::Coach;
        self.coaches.insert(id.clone());

        let roster = self.roster();
        self.send_to(id, ServerMessage::UserList(roster));
        Ok(())
    }

    /// Forget a connection entirely and report the role it held.
    /// Unknown ids are fine; a socket may close before it ever registered.
    pub fn unregister(&mut self, id: &ConnectionId) -> Option<Role> {
        self.coaches.remove(id);
        self.connections.remove(id).and_then(|conn| conn.role())
    }

    pub fn lookup(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub(super) fn lookup_mut(&mut self, id: &ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(id)
    }

    pub fn role_of(&self, id: &ConnectionId) -> Option<Role> {
        self.lookup(id).and_then(Connection::role)
    }

    /// Registered fellows in registration order
    pub fn roster(&self) -> Vec<RosterEntry> {
        let mut fellows: Vec<(&ConnectionId, &Fellow)> = self
            .connections
            .iter()
            .filter_map(|(id, conn)| conn.fellow().map(|f| (id, f)))
            .collect();
        fellows.sort_by_key(|(_, f)| f.joined_seq);

        fellows
            .into_iter()
            .map(|(id, f)| RosterEntry {
                id: id.clone(),
                name: f.name.clone(),
            })
            .collect()
    }

    /// Unicast. Returns false when the target is unknown or already closed.
    pub fn send_to(&self, id: &ConnectionId, msg: ServerMessage) -> bool {
        match self.connections.get(id) {
            Some(conn) => conn.send(msg),
            None => false,
        }
    }

    /// Fan out to every coach connection, returning how many accepted it.
    pub fn broadcast_to_coaches(&self, msg: ServerMessage) -> usize {
        self.coaches
            .iter()
            .filter(|id| self.send_to(id, msg.clone()))
            .count()
    }

    pub fn coach_count(&self) -> usize {
        self.coaches.len()
    }

    pub fn fellow_count(&self) -> usize {
        self.connections
            .values()
            .filter(|c| c.fellow().is_some())
            .count()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

/// Trim a requested display name and cap its length. Blank names yield None.
fn normalize_name(requested: Option<&str>) -> Option<String> {
    let trimmed = requested?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_NAME_CHARS).collect())
}

/// Friendly name for fellows that joined without one. Collisions are tolerated.
fn fallback_name() -> String {
    petname::petname(2, "-").unwrap_or_else(|| {
        let n: u16 = rand::rng().random_range(1000..10000);
        format!("fellow-{}", n)
    })
}
