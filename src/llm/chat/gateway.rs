use futures::StreamExt;
use log::{ debug, info, warn };
use reqwest::{ Client as HttpClient, RequestBuilder, Response, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;

use super::completion::normalize_completion;
use super::sse::{ parse_line, SseLineDecoder, StreamEvent };
use super::{ ChatCompletion, ChatError, TokenStream };
use crate::llm::LlmConfig;
use crate::models::chat::ConversationTurn;

const STREAM_CHANNEL_CAPACITY: usize = 32;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    JsonObject,
    JsonSchema {
        json_schema: JsonSchemaFormat,
    },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub schema: Value,
}

impl ResponseFormat {
    pub fn for_schema(schema: Option<&Value>) -> Self {
        match schema {
            Some(schema) =>
                ResponseFormat::JsonSchema {
                    json_schema: JsonSchemaFormat {
                        name: "response".to_string(),
                        schema: schema.clone(),
                    },
                },
            None => ResponseFormat::JsonObject,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ConversationTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ConversationTurn>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            response_format: None,
            stream: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn streaming(mut self) -> Self {
        self.stream = Some(true);
        self
    }
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

/// HTTP transport to the OpenAI-compatible gateway shared by every client
/// flavor.
#[derive(Debug, Clone)]
pub struct GatewayHttp {
    http: HttpClient,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl GatewayHttp {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        request_timeout: Option<Duration>
    ) -> Result<Self, ChatError> {
        Url::parse(base_url).map_err(|e|
            ChatError::Config(format!("Invalid gateway URL '{}': {}", base_url, e))
        )?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|e|
                        ChatError::Config(format!("Invalid API key format: {}", e))
                    )?
                );
            }
            None => warn!("Gateway client built without an API key; requests will likely be rejected"),
        }

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        Self::new(&config.base_url, config.api_key.as_deref(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    fn buffered(&self, req: RequestBuilder) -> RequestBuilder {
        match self.request_timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        }
    }

    pub async fn create_completion(
        &self,
        req: &CompletionRequest
    ) -> Result<ChatCompletion, ChatError> {
        let url = self.endpoint("/v1/chat/completions");
        debug!("POST {} model={} messages={}", url, req.model, req.messages.len());

        let resp = self.buffered(self.http.post(&url).json(req)).send().await?;
        let resp = check_status(resp).await?;
        let body = resp.bytes().await?;

        normalize_completion(&body, &req.model)
    }

    /// Sends a streaming completion request and waits for the response head.
    /// Tokens are then forwarded by a reader task that stops, and drops the
    /// upstream body, as soon as the returned stream is dropped, even while
    /// the gateway is silent.
    pub async fn stream_completion(&self, req: CompletionRequest) -> Result<TokenStream, ChatError> {
        let url = self.endpoint("/v1/chat/completions");
        let req = req.streaming();
        info!("Starting gateway stream request to {} (model={})", url, req.model);

        let resp = self.http.post(&url).json(&req).send().await?;
        let resp = check_status(resp).await?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut bytes = resp.bytes_stream();
            let mut decoder = SseLineDecoder::new();

            loop {
                let chunk_result = tokio::select! {
                    _ = tx.closed() => {
                        debug!("Downstream stream dropped; releasing gateway connection");
                        return;
                    }
                    next = bytes.next() => match next {
                        Some(chunk_result) => chunk_result,
                        None => break,
                    },
                };
                match chunk_result {
                    Ok(chunk) => {
                        for line in decoder.push(&chunk) {
                            if !forward_line(&line, &tx).await {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(ChatError::Http(e))).await;
                        return;
                    }
                }
            }

            if let Some(line) = decoder.finish() {
                forward_line(&line, &tx).await;
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    pub async fn fetch_model_ids(&self) -> Result<Vec<String>, ChatError> {
        let url = self.endpoint("/v1/models");
        debug!("GET {}", url);

        let resp = self.buffered(self.http.get(&url)).send().await?;
        let resp = check_status(resp).await?;
        let body = resp.bytes().await?;

        let models: ModelsResponse = serde_json
            ::from_slice(&body)
            .map_err(|e| ChatError::Malformed(format!("invalid model list: {}", e)))?;

        Ok(
            models.data
                .into_iter()
                .map(|m| m.id)
                .collect()
        )
    }
}

/// Returns false once the stream is finished or the receiver has gone away.
async fn forward_line(line: &str, tx: &mpsc::Sender<Result<String, ChatError>>) -> bool {
    if !line.is_empty() {
        debug!("Gateway stream line: {}", line);
    }
    match parse_line(line) {
        StreamEvent::Token(token) => tx.send(Ok(token)).await.is_ok(),
        StreamEvent::Error(message) => {
            warn!("Gateway reported an error mid-stream: {}", message);
            let _ = tx.send(Err(ChatError::Upstream(message))).await;
            false
        }
        StreamEvent::Done => false,
        StreamEvent::Skip => true,
    }
}

async fn check_status(resp: Response) -> Result<Response, ChatError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ChatError::Status { status: status.as_u16(), body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_format_without_schema_is_json_object() {
        let value = serde_json::to_value(ResponseFormat::for_schema(None)).unwrap();
        assert_eq!(value, json!({"type": "json_object"}));
    }

    #[test]
    fn test_response_format_with_schema_is_named_json_schema() {
        let schema = json!({"type": "object", "properties": {"name": {"type": "string"}}});
        let value = serde_json::to_value(ResponseFormat::for_schema(Some(&schema))).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "json_schema",
                "json_schema": {"name": "response", "schema": schema}
            })
        );
    }

    #[test]
    fn test_completion_request_omits_unset_options() {
        let req = CompletionRequest::new("m", vec![ConversationTurn::user("hi")]);
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value, json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]}));

        let value = serde_json::to_value(req.temperature(0.1).streaming()).unwrap();
        assert_eq!(value["stream"], true);
        assert!((value["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let gateway = GatewayHttp::new("http://localhost:4000/", Some("sk-1"), None).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:4000");
        assert_eq!(gateway.endpoint("/v1/models"), "http://localhost:4000/v1/models");
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let err = GatewayHttp::new("localhost", None, None).unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }
}
