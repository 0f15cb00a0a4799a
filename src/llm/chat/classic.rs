use async_trait::async_trait;

use super::gateway::{ CompletionRequest, GatewayHttp };
use super::{ ChatClient, ChatCompletion, ChatError, TokenStream, DEFAULT_CHAT_MODEL };
use crate::llm::{ ClientKind, LlmConfig };
use crate::models::catalog::ModelList;
use crate::models::chat::ConversationTurn;
use crate::models::structured::StructuredPrompt;
use crate::structured::prompt::{ compose_messages, PromptStyle };

const STRUCTURED_TEMPERATURE: f32 = 0.1;

pub const STATIC_CATALOG: [&str; 3] = ["gemini-flash-lite-latest", "gpt-4", "gpt-3.5-turbo"];

/// The first-generation backend: a fixed model catalog, the configured model
/// name echoed back, and structured output steered purely by the prompt.
pub struct ClassicChatClient {
    gateway: GatewayHttp,
    model: String,
    structured_model: String,
}

impl ClassicChatClient {
    pub fn new(gateway: GatewayHttp, model: Option<String>, structured_model: Option<String>) -> Self {
        let chat_model = model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        let structured_model = structured_model.unwrap_or_else(|| chat_model.clone());
        Self { gateway, model: chat_model, structured_model }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let gateway = GatewayHttp::from_config(config)?;
        Ok(Self::new(gateway, config.chat_model.clone(), config.structured_model.clone()))
    }

    fn with_configured_model(&self, mut completion: ChatCompletion) -> ChatCompletion {
        completion.model = self.model.clone();
        completion
    }
}

#[async_trait]
impl ChatClient for ClassicChatClient {
    async fn complete_chat(
        &self,
        messages: &[ConversationTurn]
    ) -> Result<ChatCompletion, ChatError> {
        let req = CompletionRequest::new(self.model.clone(), messages.to_vec());
        let completion = self.gateway.create_completion(&req).await?;
        Ok(self.with_configured_model(completion))
    }

    async fn complete_chat_streaming(
        &self,
        messages: &[ConversationTurn]
    ) -> Result<TokenStream, ChatError> {
        let req = CompletionRequest::new(self.model.clone(), messages.to_vec());
        self.gateway.stream_completion(req).await
    }

    async fn list_models(&self) -> Result<ModelList, ChatError> {
        Ok(ModelList::from_ids(STATIC_CATALOG))
    }

    async fn complete_structured(
        &self,
        request: &StructuredPrompt
    ) -> Result<ChatCompletion, ChatError> {
        let messages = compose_messages(request, PromptStyle::Embedded);
        let req = CompletionRequest::new(self.structured_model.clone(), messages).temperature(
            STRUCTURED_TEMPERATURE
        );
        let completion = self.gateway.create_completion(&req).await?;
        Ok(self.with_configured_model(completion))
    }

    fn kind(&self) -> ClientKind {
        ClientKind::Classic
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

    #[tokio::test]
    async fn test_static_catalog_needs_no_gateway() {
        let gateway = GatewayHttp::new("http://127.0.0.1:9", None, None).unwrap();
        let client = ClassicChatClient::new(gateway, None, None);

        let models = client.list_models().await.unwrap();
        assert_eq!(models.ids(), STATIC_CATALOG.to_vec());
        assert!(models.data.iter().all(|m| m.object == "model"));
    }
}
