use async_trait::async_trait;
use log::{ debug, info };

use super::gateway::{ CompletionRequest, GatewayHttp, ResponseFormat };
use super::{ ChatClient, ChatCompletion, ChatError, TokenStream, DEFAULT_CHAT_MODEL };
use crate::llm::{ ClientKind, LlmConfig };
use crate::models::catalog::ModelList;
use crate::models::chat::ConversationTurn;
use crate::models::structured::StructuredPrompt;
use crate::structured::prompt::{ compose_messages, PromptStyle };

/// Provider prefix that makes the proxy treat a model as OpenAI-compatible,
/// which is what `response_format` needs.
const STRUCTURED_ROUTE_PREFIX: &str = "openai/";

/// LiteLLM-style client. Model names carry a provider prefix that the proxy
/// uses for routing, and structured calls are routed through the
/// OpenAI-compatible provider.
pub struct LiteLlmChatClient {
    gateway: GatewayHttp,
    model: String,
    structured_model: String,
}

impl LiteLlmChatClient {
    pub fn new(gateway: GatewayHttp, model: Option<String>, structured_model: Option<String>) -> Self {
        let chat_model = model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        let structured_model = structured_model.unwrap_or_else(|| structured_route(&chat_model));
        Self { gateway, model: chat_model, structured_model }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let gateway = GatewayHttp::from_config(config)?;
        Ok(Self::new(gateway, config.chat_model.clone(), config.structured_model.clone()))
    }

    pub fn structured_model(&self) -> &str {
        &self.structured_model
    }
}

/// `gemini/gemini-flash-lite-latest` -> `openai/gemini-flash-lite-latest`
pub fn structured_route(model: &str) -> String {
    let bare = model.rsplit('/').next().unwrap_or(model);
    format!("{}{}", STRUCTURED_ROUTE_PREFIX, bare)
}

#[async_trait]
impl ChatClient for LiteLlmChatClient {
    async fn complete_chat(
        &self,
        messages: &[ConversationTurn]
    ) -> Result<ChatCompletion, ChatError> {
        let req = CompletionRequest::new(self.model.clone(), messages.to_vec());
        self.gateway.create_completion(&req).await
    }

    async fn complete_chat_streaming(
        &self,
        messages: &[ConversationTurn]
    ) -> Result<TokenStream, ChatError> {
        let req = CompletionRequest::new(self.model.clone(), messages.to_vec());
        self.gateway.stream_completion(req).await
    }

    async fn list_models(&self) -> Result<ModelList, ChatError> {
        let ids = self.gateway.fetch_model_ids().await?;
        info!("LiteLLM proxy reported {} models", ids.len());
        Ok(ModelList::from_ids(ids))
    }

    async fn complete_structured(
        &self,
        request: &StructuredPrompt
    ) -> Result<ChatCompletion, ChatError> {
        debug!("Routing structured request through {}", self.structured_model);
        let messages = compose_messages(request, PromptStyle::ResponseFormat);
        let req = CompletionRequest::new(self.structured_model.clone(), messages).response_format(
            ResponseFormat::for_schema(request.schema.as_ref())
        );
        self.gateway.create_completion(&req).await
    }

    fn kind(&self) -> ClientKind {
        ClientKind::LiteLLM
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> String {
        self.gateway.base_url().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_route_replaces_provider_prefix() {
        assert_eq!(structured_route("gemini/gemini-flash-lite-latest"), "openai/gemini-flash-lite-latest");
        assert_eq!(structured_route("gpt-4"), "openai/gpt-4");
    }

    #[test]
    fn test_explicit_structured_model_wins() {
        let gateway = GatewayHttp::new("http://localhost:4000", None, None).unwrap();
        let client = LiteLlmChatClient::new(gateway, None, Some("openai/custom".into()));
        assert_eq!(client.structured_model(), "openai/custom");
        assert_eq!(client.get_model(), DEFAULT_CHAT_MODEL);
    }
}
