//! Recovery of JSON from a model reply.
//!
//! Models asked for "JSON only" still like to wrap it in a Markdown code
//! fence. The extractor tries a strict parse first, then strips at most one
//! leading fence marker and one trailing marker and tries again. Nothing more
//! clever than that is attempted.

pub mod prompt;

use serde_json::Value;

use crate::llm::chat::ChatCompletion;
use crate::models::structured::StructuredResult;

pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse response as JSON";

pub fn extract_json(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Some(value);
    }
    serde_json::from_str(strip_code_fence(raw)).ok()
}

pub fn strip_code_fence(raw: &str) -> &str {
    let cleaned = raw.trim();
    let cleaned = cleaned
        .strip_prefix("```json")
        .or_else(|| cleaned.strip_prefix("```"))
        .unwrap_or(cleaned);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned);
    cleaned.trim()
}

pub fn into_structured_result(completion: ChatCompletion) -> StructuredResult {
    match extract_json(&completion.content) {
        Some(data) => StructuredResult::parsed(data, completion.content, completion.usage),
        None => StructuredResult::unparsed(PARSE_FAILURE_MESSAGE, completion.content),
    }
}
