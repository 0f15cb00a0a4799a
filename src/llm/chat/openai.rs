use async_trait::async_trait;
use log::info;

use super::gateway::{ CompletionRequest, GatewayHttp, ResponseFormat };
use super::{ ChatClient, ChatCompletion, ChatError, TokenStream, DEFAULT_CHAT_MODEL };
use crate::llm::{ ClientKind, LlmConfig };
use crate::models::catalog::ModelList;
use crate::models::chat::ConversationTurn;
use crate::models::structured::StructuredPrompt;
use crate::structured::prompt::{ compose_messages, PromptStyle };

/// Talks to the gateway the way the official OpenAI SDK does: models come
/// from `/v1/models` and structured output relies on `response_format`.
pub struct OpenAIChatClient {
    gateway: GatewayHttp,
    model: String,
}

impl OpenAIChatClient {
    pub fn new(gateway: GatewayHttp, model: Option<String>) -> Self {
        let chat_model = model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        Self { gateway, model: chat_model }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let gateway = GatewayHttp::from_config(config)?;
        Ok(Self::new(gateway, config.chat_model.clone()))
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
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
        info!("Gateway reported {} models", ids.len());
        Ok(ModelList::from_ids(ids))
    }

    async fn complete_structured(
        &self,
        request: &StructuredPrompt
    ) -> Result<ChatCompletion, ChatError> {
        let messages = compose_messages(request, PromptStyle::ResponseFormat);
        let req = CompletionRequest::new(self.model.clone(), messages).response_format(
            ResponseFormat::for_schema(request.schema.as_ref())
        );
        self.gateway.create_completion(&req).await
    }

    fn kind(&self) -> ClientKind {
        ClientKind::OpenAI
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> String {
        self.gateway.base_url().to_string()
    }
}
