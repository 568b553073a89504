//! Bridge between a fellow's assistant thread and the completion service.
//!
//! The outbound call is the only await point in message handling. No registry
//! lock is held while it runs, so other connections keep flowing; the caller's
//! own later events wait because its worker processes events one at a time.

use crate::llm::{CompletionRequest, LlmError, LlmResult};
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::*;
use std::sync::Arc;

/// Shown to the fellow when the assistant could not answer. Never written to history.
pub const ASSISTANT_FALLBACK_TEXT: &str =
    "Sorry, the assistant is unavailable right now. Please try again in a moment.";

/// Record a fellow's question, ask the completion service, and produce the
/// reply for that fellow alone.
///
/// Returns None when the fellow is not registered, or left before the reply
/// arrived.
pub async fn handle_user_query(
    state: &Arc<AppState>,
    fellow_id: &ConnectionId,
    text: String,
) -> Option<ServerMessage> {
    let (question, history) = {
        let mut registry = state.registry.write().await;
        let question = registry.append_assistant_message(fellow_id, AssistantRole::User, text)?;
        (question, registry.assistant_history(fellow_id))
    };

    let request = CompletionRequest::from_history(&history, &state.llm_config);
    let reply = match request_completion(state, request).await {
        Ok(reply_text) => {
            let mut registry = state.registry.write().await;
            match registry.append_assistant_message(
                fellow_id,
                AssistantRole::Assistant,
                reply_text,
            ) {
                Some(msg) => msg,
                None => {
                    tracing::debug!(
                        "Fellow {} left before the assistant replied, discarding",
                        fellow_id
                    );
                    return None;
                }
            }
        }
        Err(e) => {
            tracing::error!("Assistant call for {} failed: {}", fellow_id, e);
            // A failed exchange leaves the thread as it was before the question
            state
                .registry
                .write()
                .await
                .retract_assistant_message(fellow_id, &question);
            AssistantMessage {
                role: AssistantRole::Assistant,
                text: ASSISTANT_FALLBACK_TEXT.to_string(),
                timestamp: now_timestamp(),
            }
        }
    };

    Some(ServerMessage::AiMessage(reply))
}

/// Full assistant thread, for the fellow that owns it
pub async fn handle_history_request(
    state: &Arc<AppState>,
    fellow_id: &ConnectionId,
) -> Option<ServerMessage> {
    let registry = state.registry.read().await;
    registry.lookup(fellow_id)?.fellow()?;

    Some(ServerMessage::AiHistory {
        messages: registry.assistant_history(fellow_id),
    })
}

/// One bounded call to the configured provider
async fn request_completion(state: &AppState, request: CompletionRequest) -> LlmResult<String> {
    let provider = state.llm.as_ref().ok_or_else(|| {
        LlmError::ConfigError("no assistant credential configured".to_string())
    })?;

    let timeout = request.timeout;
    let response = tokio::time::timeout(timeout, provider.complete(request))
        .await
        .map_err(|_| LlmError::Timeout(timeout))??;

    tracing::debug!(
        "Assistant reply from {} ({}) in {}ms, tokens: {:?}",
        response.metadata.provider,
        response.metadata.model,
        response.metadata.latency_ms,
        response.metadata.tokens_used
    );
    Ok(response.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, LlmConfig, LlmProvider, ResponseMetadata};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use crate::state::OUTBOUND_CAPACITY;
    use tokio::sync::mpsc;

    /// Replies with a fixed text and records every request it sees
    struct EchoProvider {
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
            let last = request
                .messages
                .last()
                .map(|t| t.content.clone())
                .unwrap_or_default();
            self.seen.lock().unwrap().push(request);
            Ok(CompletionResponse {
                text: format!("echo: {}", last),
                metadata: ResponseMetadata {
                    provider: "echo".to_string(),
                    model: "echo-1".to_string(),
                    tokens_used: None,
                    latency_ms: 0,
                },
            })
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl LlmProvider for SlowProvider {
        async fn complete(&self, _request: CompletionRequest) -> LlmResult<CompletionResponse> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Err(LlmError::ApiError("unreachable".to_string()))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    async fn state_with_fellow(
        llm: Option<Arc<dyn LlmProvider>>,
        config: LlmConfig,
    ) -> Arc<AppState> {
        let state = Arc::new(AppState::new_with_llm(llm, config));
        let (tx, _rx) = mpsc::channel(OUTBOUND_CAPACITY);
        state.connect("A".to_string(), tx).await;
        state
            .registry
            .write()
            .await
            .register_fellow(&"A".to_string(), Some("Ada"))
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_success_appends_both_turns() {
        let provider = Arc::new(EchoProvider {
            seen: Mutex::new(Vec::new()),
        });
        let state = state_with_fellow(Some(provider.clone()), LlmConfig::default()).await;
        let id = "A".to_string();

        let reply = handle_user_query(&state, &id, "first".to_string()).await;
        match reply {
            Some(ServerMessage::AiMessage(msg)) => {
                assert_eq!(msg.role, AssistantRole::Assistant);
                assert_eq!(msg.text, "echo: first");
            }
            other => panic!("Expected AiMessage, got {:?}", other),
        }

        handle_user_query(&state, &id, "second".to_string()).await;

        let history = state.registry.read().await.assistant_history(&id);
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "echo: first", "second", "echo: second"]);

        // The second call carries the whole conversation
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[1].messages.len(), 3);
        assert_eq!(seen[1].messages[1].role, AssistantRole::Assistant);
    }

    #[tokio::test]
    async fn test_missing_credential_falls_back_and_leaves_log_untouched() {
        let state = state_with_fellow(None, LlmConfig::default()).await;
        let id = "A".to_string();

        let reply = handle_user_query(&state, &id, "hello?".to_string()).await;
        match reply {
            Some(ServerMessage::AiMessage(msg)) => assert_eq!(msg.text, ASSISTANT_FALLBACK_TEXT),
            other => panic!("Expected fallback AiMessage, got {:?}", other),
        }

        assert!(state.registry.read().await.assistant_history(&id).is_empty());
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let config = LlmConfig {
            default_timeout: Duration::from_millis(50),
            ..LlmConfig::default()
        };
        let state = state_with_fellow(Some(Arc::new(SlowProvider)), config).await;
        let id = "A".to_string();

        let reply = handle_user_query(&state, &id, "anyone there?".to_string()).await;
        assert!(matches!(
            reply,
            Some(ServerMessage::AiMessage(ref msg)) if msg.text == ASSISTANT_FALLBACK_TEXT
        ));
        assert!(state.registry.read().await.assistant_history(&id).is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_sender_is_ignored() {
        let state = Arc::new(AppState::new());
        let reply = handle_user_query(&state, &"ghost".to_string(), "hi".to_string()).await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_history_request() {
        let provider = Arc::new(EchoProvider {
            seen: Mutex::new(Vec::new()),
        });
        let state = state_with_fellow(Some(provider), LlmConfig::default()).await;
        let id = "A".to_string();
        handle_user_query(&state, &id, "hello".to_string()).await;

        match handle_history_request(&state, &id).await {
            Some(ServerMessage::AiHistory { messages }) => {
                assert_eq!(messages.len(), 2);
                assert_eq!(messages[0].text, "hello");
                assert_eq!(messages[1].text, "echo: hello");
            }
            other => panic!("Expected AiHistory, got {:?}", other),
        }

        assert!(handle_history_request(&state, &"ghost".to_string())
            .await
            .is_none());
    }
}
