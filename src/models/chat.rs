use serde::{ Serialize, Deserialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Body of `POST /chat` and `POST /chat/stream`.
///
/// `message` is optional at the serde level so that a missing field can be
/// reported as a validation error rather than a body rejection.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_history: Option<Vec<ConversationTurn>>,
}

impl ChatRequest {
    /// History followed by the new user turn, in chronological order.
    pub fn into_messages(self, message: String) -> Vec<ConversationTurn> {
        build_messages(self.conversation_history.unwrap_or_default(), message)
    }
}

pub fn build_messages(history: Vec<ConversationTurn>, message: String) -> Vec<ConversationTurn> {
    let mut messages = history;
    messages.push(ConversationTurn::user(message));
    messages
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub model: String,
    pub usage: Usage,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamChunk {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_messages_appends_user_turn_last() {
        let history = vec![
            ConversationTurn::system("be brief"),
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("hello"),
        ];

        let messages = build_messages(history.clone(), "how are you?".to_string());

        assert_eq!(messages.len(), 4);
        assert_eq!(&messages[..3], &history[..]);
        assert_eq!(messages[3], ConversationTurn::user("how are you?"));
    }

    #[test]
    fn test_request_without_history_yields_single_turn() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "ping"}"#).unwrap();
        let message = req.message.clone().unwrap();

        let messages = req.into_messages(message);
        assert_eq!(messages, vec![ConversationTurn::user("ping")]);
    }

    #[test]
    fn test_missing_message_is_none() {
        let req: ChatRequest = serde_json::from_str(r#"{"conversation_history": []}"#).unwrap();
        assert!(req.message.is_none());
    }

    #[test]
    fn test_role_rejects_unknown_value() {
        let result = serde_json::from_str::<ConversationTurn>(r#"{"role": "tool", "content": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ConversationTurn::assistant("ok")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "ok");
    }

    #[test]
    fn test_usage_new_sums_total() {
        let usage = Usage::new(12, 30);
        assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
    }
}
