pub mod classic;
pub mod completion;
pub mod gateway;
pub mod litellm;
pub mod openai;
pub mod sse;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use super::{ ClientKind, LlmConfig };
use self::classic::ClassicChatClient;
use self::litellm::LiteLlmChatClient;
use self::openai::OpenAIChatClient;
use crate::models::catalog::ModelList;
use crate::models::chat::{ ChatResponse, ConversationTurn, Usage };
use crate::models::structured::StructuredPrompt;

pub const DEFAULT_CHAT_MODEL: &str = "gemini/gemini-flash-lite-latest";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway returned HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    /// Error object sent by the gateway inside an otherwise successful stream.
    #[error("gateway stream error: {0}")]
    Upstream(String),
    #[error("malformed gateway response: {0}")]
    Malformed(String),
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ChatError {
    /// HTTP status reported by the gateway, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Status { status, .. } => Some(*status),
            ChatError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

/// Normalized result of a buffered completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

impl ChatCompletion {
    pub fn into_response(self) -> ChatResponse {
        ChatResponse {
            response: self.content,
            model: self.model,
            usage: self.usage,
        }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete_chat(
        &self,
        messages: &[ConversationTurn]
    ) -> Result<ChatCompletion, ChatError>;

    /// Opens the upstream stream. Connection and status failures are returned
    /// here, before any token is yielded.
    async fn complete_chat_streaming(
        &self,
        messages: &[ConversationTurn]
    ) -> Result<TokenStream, ChatError>;

    async fn list_models(&self) -> Result<ModelList, ChatError>;

    async fn complete_structured(
        &self,
        request: &StructuredPrompt
    ) -> Result<ChatCompletion, ChatError>;

    fn kind(&self) -> ClientKind;
    fn get_model(&self) -> String;
    fn get_base_url(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ChatError> {
    let client: Arc<dyn ChatClient> = match config.client_kind {
        ClientKind::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        ClientKind::LiteLLM => {
            let specific_client = LiteLlmChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        ClientKind::Classic => {
            let specific_client = ClassicChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_selects_flavor() {
        for kind in [ClientKind::OpenAI, ClientKind::LiteLLM, ClientKind::Classic] {
            let config = LlmConfig { client_kind: kind, ..LlmConfig::default() };
            let client = new_client(&config).unwrap();
            assert_eq!(client.kind(), kind);
            assert_eq!(client.get_model(), DEFAULT_CHAT_MODEL);
        }
    }

    #[test]
    fn test_new_client_rejects_bad_base_url() {
        let config = LlmConfig { base_url: "not a url".into(), ..LlmConfig::default() };
        let err = new_client(&config).err().unwrap();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn test_status_error_exposes_code() {
        let err = ChatError::Status { status: 401, body: "denied".into() };
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "gateway returned HTTP 401: denied");
        assert_eq!(ChatError::Malformed("x".into()).status(), None);
    }
}
