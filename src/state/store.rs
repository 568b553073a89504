//! Per-fellow message logs
//!
//! Appends are no-ops for ids that are not registered fellows: a message can
//! arrive for someone who disconnected a moment ago, and that is not an error.

use super::registry::Registry;
use crate::types::*;

impl Registry {
    /// Append to a fellow's coach thread. Returns the stored record, or None
    /// if `fellow_id` is not currently a registered fellow.
    pub fn append_coach_message(
        &mut self,
        fellow_id: &ConnectionId,
        origin: Origin,
        text: String,
    ) -> Option<CoachMessage> {
        let fellow = self.lookup_mut(fellow_id)?.fellow_mut()?;

        let msg = CoachMessage {
            from: origin,
            text,
            timestamp: now_timestamp(),
            user_id: fellow_id.clone(),
            user_name: match origin {
                Origin::User => Some(fellow.name.clone()),
                Origin::Admin => None,
            },
        };
        fellow.coach_log.push(msg.clone());
        Some(msg)
    }

    /// Append to a fellow's assistant thread
    pub fn append_assistant_message(
        &mut self,
        fellow_id: &ConnectionId,
        role: AssistantRole,
        text: String,
    ) -> Option<AssistantMessage> {
        let fellow = self.lookup_mut(fellow_id)?.fellow_mut()?;

        let msg = AssistantMessage {
            role,
            text,
            timestamp: now_timestamp(),
        };
        fellow.assistant_log.push(msg.clone());
        Some(msg)
    }

    /// Take back the most recent assistant-thread turn if it is `msg`.
    /// Used when a question goes unanswered so the thread stays a clean
    /// alternation of questions and replies.
    pub fn retract_assistant_message(
        &mut self,
        fellow_id: &ConnectionId,
        msg: &AssistantMessage,
    ) -> bool {
        let Some(fellow) = self.lookup_mut(fellow_id).and_then(|c| c.fellow_mut()) else {
            return false;
        };
        if fellow.assistant_log.last() == Some(msg) {
            fellow.assistant_log.pop();
            true
        } else {
            false
        }
    }

    pub fn coach_history(&self, fellow_id: &ConnectionId) -> Vec<CoachMessage> {
        self.lookup(fellow_id)
            .and_then(|conn| conn.fellow())
            .map(|f| f.coach_log.clone())
            .unwrap_or_default()
    }

    pub fn assistant_history(&self, fellow_id: &ConnectionId) -> Vec<AssistantMessage> {
        self.lookup(fellow_id)
            .and_then(|conn| conn.fellow())
            .map(|f| f.assistant_log.clone())
            .unwrap_or_default()
    }
}
