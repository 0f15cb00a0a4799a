pub mod chat;
use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "https://litellm.sph-prod.ethz.ch";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    OpenAI,
    LiteLLM,
    Classic,
}

impl ClientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::OpenAI => "openai",
            ClientKind::LiteLLM => "litellm",
            ClientKind::Classic => "classic",
        }
    }

    /// `backend` value reported by `/health`. The classic backend reports none.
    pub fn health_tag(&self) -> Option<&'static str> {
        match self {
            ClientKind::OpenAI => Some("openai-sdk"),
            ClientKind::LiteLLM => Some("litellm-sdk"),
            ClientKind::Classic => None,
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseClientKindError {
    message: String,
}

impl fmt::Display for ParseClientKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseClientKindError {}

impl FromStr for ClientKind {
    type Err = ParseClientKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "openai-sdk" => Ok(ClientKind::OpenAI),
            "litellm" | "litellm-sdk" => Ok(ClientKind::LiteLLM),
            "classic" => Ok(ClientKind::Classic),
            _ =>
                Err(ParseClientKindError {
                    message: format!("Invalid client type: '{}' (expected openai, litellm or classic)", s),
                }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub client_kind: ClientKind,
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: Option<String>,
    pub structured_model: Option<String>,
    /// Total timeout for buffered gateway calls. Streaming calls ignore it.
    pub request_timeout: Option<Duration>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            client_kind: ClientKind::OpenAI,
            api_key: None,
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            chat_model: None,
            structured_model: None,
            request_timeout: None,
        }
    }
}

impl LlmConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().map(|k| !k.trim().is_empty()).unwrap_or(false)
    }
}
