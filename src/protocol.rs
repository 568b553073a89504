use crate::types::*;
use serde::{Deserialize, Serialize};

/// Events sent by clients.
///
/// Frames look like `{"event": "user-message", "data": "hello"}`. Events
/// without a payload omit `data` entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Join as a fellow, optionally with a display name
    RegisterUser(Option<RegisterUserPayload>),
    /// Join as the coach
    RegisterAdmin,
    /// Fellow -> coach
    UserMessage(String),
    /// Coach -> one fellow
    AdminMessage(AdminMessagePayload),
    /// Coach asks for one fellow's coach thread
    GetHistory(ConnectionId),
    /// Fellow -> assistant
    UserAiMessage(String),
    /// Fellow asks for its own assistant thread
    GetAiHistory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterUserPayload {
    #[serde(default)]
    pub name: Option<String>,
}

/// Both fields are optional on the wire; a frame missing either is dropped
/// by the router instead of failing to decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminMessagePayload {
    #[serde(default)]
    pub user_id: Option<ConnectionId>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Events sent by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Current fellows, in registration order (coach only)
    UserList(Vec<RosterEntry>),
    /// Confirms a fellow registration and tells the client its own id
    Registered { id: ConnectionId, name: String },
    /// A coach-thread message, delivered to the coach group or to a fellow
    NewMessage(CoachMessage),
    /// Full coach thread of one fellow
    History {
        #[serde(rename = "userId")]
        user_id: ConnectionId,
        messages: Vec<CoachMessage>,
    },
    /// Assistant reply, or the fallback text when the assistant failed
    AiMessage(AssistantMessage),
    /// Full assistant thread of the requesting fellow
    AiHistory { messages: Vec<AssistantMessage> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_register_user_with_name() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"register-user","data":{"name":"Ada"}}"#).unwrap();
        match msg {
            ClientMessage::RegisterUser(Some(payload)) => {
                assert_eq!(payload.name.as_deref(), Some("Ada"));
            }
            other => panic!("Expected RegisterUser, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_register_user_without_name() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"register-user","data":{}}"#).unwrap();
        match msg {
            ClientMessage::RegisterUser(Some(payload)) => assert!(payload.name.is_none()),
            other => panic!("Expected RegisterUser, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unit_events() {
        let msg: ClientMessage = serde_json::from_str(r#"{"event":"register-admin"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::RegisterAdmin));

        let msg: ClientMessage = serde_json::from_str(r#"{"event":"get-ai-history"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::GetAiHistory));
    }

    #[test]
    fn test_parse_admin_message_missing_text() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"admin-message","data":{"userId":"abc"}}"#)
                .unwrap();
        match msg {
            ClientMessage::AdminMessage(payload) => {
                assert_eq!(payload.user_id.as_deref(), Some("abc"));
                assert!(payload.text.is_none());
            }
            other => panic!("Expected AdminMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"event":"launch-rockets"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_message_wire_shape() {
        let msg = ServerMessage::NewMessage(CoachMessage {
            from: Origin::User,
            text: "hello".to_string(),
            timestamp: "2024-01-01T00:00:00+00:00".to_string(),
            user_id: "A".to_string(),
            user_name: Some("Ada".to_string()),
        });
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["event"], "new-message");
        assert_eq!(json["data"]["from"], "user");
        assert_eq!(json["data"]["userId"], "A");
        assert_eq!(json["data"]["userName"], "Ada");
    }

    #[test]
    fn test_admin_message_omits_user_name() {
        let msg = ServerMessage::NewMessage(CoachMessage {
            from: Origin::Admin,
            text: "hi".to_string(),
            timestamp: "2024-01-01T00:00:00+00:00".to_string(),
            user_id: "A".to_string(),
            user_name: None,
        });
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["data"]["from"], "admin");
        assert!(json["data"].get("userName").is_none());
    }

    #[test]
    fn test_history_wire_shape() {
        let msg = ServerMessage::History {
            user_id: "A".to_string(),
            messages: vec![],
        };
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["event"], "history");
        assert_eq!(json["data"]["userId"], "A");
        assert!(json["data"]["messages"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_user_list_wire_shape() {
        let msg = ServerMessage::UserList(vec![RosterEntry {
            id: "A".to_string(),
            name: "Ada".to_string(),
        }]);
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["event"], "user-list");
        assert_eq!(json["data"][0]["id"], "A");
        assert_eq!(json["data"][0]["name"], "Ada");
    }
}
