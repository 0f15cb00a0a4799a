use serde::{ Serialize, Deserialize };
use serde_json::Value;

use super::chat::Usage;

/// Body of `POST /structured`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StructuredRequest {
    pub prompt: Option<String>,
    pub data: Option<String>,
    pub schema: Option<Value>,
}

/// Validated structured prompt handed to the upstream client.
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredPrompt {
    pub prompt: String,
    pub data: Option<String>,
    pub schema: Option<Value>,
}

impl StructuredPrompt {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), data: None, schema: None }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredResult {
    Parsed {
        success: bool,
        data: Value,
        raw_response: String,
        usage: Usage,
    },
    Unparsed {
        success: bool,
        error: String,
        raw_response: String,
    },
}

impl StructuredResult {
    pub fn parsed(data: Value, raw_response: String, usage: Usage) -> Self {
        StructuredResult::Parsed { success: true, data, raw_response, usage }
    }

    pub fn unparsed(error: impl Into<String>, raw_response: String) -> Self {
        StructuredResult::Unparsed { success: false, error: error.into(), raw_response }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StructuredResult::Parsed { .. })
    }

    pub fn raw_response(&self) -> &str {
        match self {
            StructuredResult::Parsed { raw_response, .. } => raw_response,
            StructuredResult::Unparsed { raw_response, .. } => raw_response,
        }
    }
}
