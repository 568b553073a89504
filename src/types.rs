use serde::{Deserialize, Serialize};

/// Opaque transport-assigned connection identifier
pub type ConnectionId = String;

/// Who wrote a message on the coach thread
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Admin,
}

/// Who wrote a turn on the assistant thread
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssistantRole {
    User,
    Assistant,
}

/// Role a connection holds once it has registered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Fellow,
    Coach,
}

/// A message on the fellow <-> coach thread.
///
/// The fellow's display name is copied in at write time so that coach
/// dashboards can render history without a roster lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoachMessage {
    pub from: Origin,
    pub text: String,
    pub timestamp: String,
    pub user_id: ConnectionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// A turn on the fellow <-> assistant thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantMessage {
    pub role: AssistantRole,
    pub text: String,
    pub timestamp: String,
}

/// One line of the roster pushed to coaches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterEntry {
    pub id: ConnectionId,
    pub name: String,
}

/// Current time as an RFC 3339 timestamp
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
