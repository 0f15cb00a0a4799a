use crate::models::chat::ConversationTurn;
use crate::models::structured::StructuredPrompt;

pub const RESPONSE_FORMAT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Always respond with valid JSON only.";

pub const EMBEDDED_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that extracts and returns structured data.\n\
Always respond with valid JSON only. No explanations, no markdown, just pure JSON.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// The gateway enforces JSON through `response_format`; the schema travels
    /// there, not in the prompt.
    ResponseFormat,
    /// Everything, including the schema, is spelled out in the user prompt.
    Embedded,
}

pub fn compose_messages(request: &StructuredPrompt, style: PromptStyle) -> Vec<ConversationTurn> {
    let system = match style {
        PromptStyle::ResponseFormat => RESPONSE_FORMAT_SYSTEM_PROMPT,
        PromptStyle::Embedded => EMBEDDED_SYSTEM_PROMPT,
    };

    vec![ConversationTurn::system(system), ConversationTurn::user(compose_user_prompt(request, style))]
}

pub fn compose_user_prompt(request: &StructuredPrompt, style: PromptStyle) -> String {
    let mut full_prompt = request.prompt.clone();

    if let Some(data) = request.data.as_deref().filter(|d| !d.is_empty()) {
        full_prompt.push_str("\n\nData to process:\n");
        full_prompt.push_str(data);
    }

    if style == PromptStyle::Embedded {
        if let Some(schema) = request.schema.as_ref().filter(|s| !s.is_null()) {
            let pretty = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
            full_prompt.push_str("\n\nExpected JSON schema:\n");
            full_prompt.push_str(&pretty);
        }
    }

    full_prompt
}
