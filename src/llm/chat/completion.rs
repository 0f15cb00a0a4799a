//! Normalization of buffered gateway replies.
//!
//! The gateway speaks the OpenAI chat-completions format. Only the first
//! choice's message content and the three usage counters are kept; they are
//! passed through verbatim. Anything missing fails the whole request.

use serde::Deserialize;

use super::{ ChatCompletion, ChatError };
use crate::models::chat::Usage;

#[derive(Deserialize)]
struct UpstreamCompletion {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<UpstreamChoice>,
    usage: Option<UpstreamUsage>,
}

#[derive(Deserialize)]
struct UpstreamChoice {
    message: Option<UpstreamMessage>,
}

#[derive(Deserialize)]
struct UpstreamMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

/// `requested_model` is reported when the gateway omits `model`.
pub fn normalize_completion(
    body: &[u8],
    requested_model: &str
) -> Result<ChatCompletion, ChatError> {
    let completion: UpstreamCompletion = serde_json
        ::from_slice(body)
        .map_err(|e| ChatError::Malformed(format!("invalid completion body: {}", e)))?;

    let content = completion.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| missing("choices[0].message.content"))?;

    let usage = completion.usage.ok_or_else(|| missing("usage"))?;
    let usage = Usage {
        prompt_tokens: usage.prompt_tokens.ok_or_else(|| missing("usage.prompt_tokens"))?,
        completion_tokens: usage.completion_tokens.ok_or_else(||
            missing("usage.completion_tokens")
        )?,
        total_tokens: usage.total_tokens.ok_or_else(|| missing("usage.total_tokens"))?,
    };

    Ok(ChatCompletion {
        content,
        model: completion.model.unwrap_or_else(|| requested_model.to_string()),
        usage,
    })
}

fn missing(field: &str) -> ChatError {
    ChatError::Malformed(format!("missing field '{}'", field))
}
