use clap::Parser;
use std::time::Duration;

use crate::llm::{ ClientKind, LlmConfig, ParseClientKindError, DEFAULT_GATEWAY_URL };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Gateway Args ---
    /// Upstream client flavor (openai, litellm, classic)
    #[arg(long, env = "CLIENT_TYPE", default_value = "openai")]
    pub client_type: String,

    /// Base URL of the OpenAI-compatible gateway
    #[arg(long, env = "LITELLM_BASE_URL", default_value = DEFAULT_GATEWAY_URL)]
    pub gateway_url: String,

    /// Bearer token sent to the gateway
    #[arg(long, env = "LITELLM_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Model used for chat completions (e.g., gemini/gemini-flash-lite-latest)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on client defaults if None
    pub chat_model: Option<String>,

    /// Model used for structured output. Defaults depend on the client flavor.
    #[arg(long, env = "STRUCTURED_MODEL")]
    pub structured_model: Option<String>,

    /// Total timeout in seconds for non-streaming gateway calls. Unset means no timeout.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    // --- General App Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:5000")]
    pub server_addr: String,

    /// Directory holding the frontend page.
    #[arg(long, env = "STATIC_DIR", default_value = ".")]
    pub static_dir: String,

    /// Frontend page served at `/`.
    #[arg(long, env = "INDEX_FILE", default_value = "index.html")]
    pub index_file: String,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    pub fn llm_config(&self) -> Result<LlmConfig, ParseClientKindError> {
        let client_kind: ClientKind = self.client_type.parse()?;
        let api_key = if !self.api_key.trim().is_empty() {
            Some(self.api_key.clone())
        } else {
            None
        };

        Ok(LlmConfig {
            client_kind,
            api_key,
            base_url: self.gateway_url.clone(),
            chat_model: self.chat_model.clone().filter(|m| !m.trim().is_empty()),
            structured_model: self.structured_model.clone().filter(|m| !m.trim().is_empty()),
            request_timeout: self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }

    /// First characters of the API key, for startup logging.
    pub fn api_key_hint(&self) -> String {
        if self.api_key.trim().is_empty() {
            return "NO".to_string();
        }
        let prefix: String = self.api_key.chars().take(10).collect();
        format!("Yes ({}...)", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["llm-relay"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_llm_config_from_flags() {
        let args = parse(
            &[
                "--client-type",
                "classic",
                "--gateway-url",
                "http://localhost:4000",
                "--api-key",
                "sk-test",
                "--chat-model",
                "gpt-4",
                "--request-timeout-secs",
                "30",
            ]
        );
        let config = args.llm_config().unwrap();

        assert_eq!(config.client_kind, ClientKind::Classic);
        assert_eq!(config.base_url, "http://localhost:4000");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.chat_model.as_deref(), Some("gpt-4"));
        assert_eq!(config.structured_model, None);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let args = parse(&["--request-timeout-secs", "0", "--client-type", "openai"]);
        assert_eq!(args.llm_config().unwrap().request_timeout, None);
    }

    #[test]
    fn test_invalid_client_type_is_rejected() {
        let args = parse(&["--client-type", "bogus"]);
        assert!(args.llm_config().is_err());
    }

    #[test]
    fn test_api_key_hint() {
        let args = parse(&["--api-key", "sk-1234567890abcdef"]);
        assert_eq!(args.api_key_hint(), "Yes (sk-1234567...)");

        let args = parse(&["--api-key", ""]);
        assert_eq!(args.api_key_hint(), "NO");
    }
}
