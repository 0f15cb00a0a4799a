//! Decoding of the gateway's `text/event-stream` completion body.

use log::debug;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Token(String),
    /// In-band `{"error": ...}` object; the stream cannot continue.
    Error(String),
    Done,
    Skip,
}

/// Splits a byte stream into lines, holding back a trailing partial line
/// (including a split multi-byte character) until the next chunk arrives.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(decode_line(&line[..line.len() - 1]));
        }
        lines
    }

    /// Remaining bytes once the body has ended without a final newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

pub fn parse_line(line: &str) -> StreamEvent {
    let data = match line.strip_prefix("data:") {
        Some(data) => data.trim_start(),
        None => {
            return StreamEvent::Skip;
        }
    };

    if data == "[DONE]" {
        return StreamEvent::Done;
    }

    match serde_json::from_str::<StreamResponse>(data) {
        Ok(StreamResponse { error: Some(error), .. }) => StreamEvent::Error(error_message(&error)),
        Ok(resp) => {
            let content = resp.choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta)
                .and_then(|delta| delta.content)
                .filter(|content| !content.is_empty());
            match content {
                Some(token) => StreamEvent::Token(token),
                None => StreamEvent::Skip,
            }
        }
        Err(e) => {
            debug!("Skipping unparsable stream line: {} ({})", data, e);
            StreamEvent::Skip
        }
    }
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) =>
            match fields.get("message") {
                Some(Value::String(message)) => message.clone(),
                _ => error.to_string(),
            }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"index": 0, "delta": {"content": content}}]})
        )
    }

    #[test]
    fn test_decoder_joins_lines_split_across_chunks() {
        let body = chunk("Hello");
        let (a, b) = body.split_at(10);
        let mut decoder = SseLineDecoder::new();

        assert!(decoder.push(a.as_bytes()).is_empty());
        let lines = decoder.push(b.as_bytes());
        assert_eq!(lines.len(), 2);
        assert_eq!(parse_line(&lines[0]), StreamEvent::Token("Hello".into()));
        assert_eq!(lines[1], "");
    }

    #[test]
    fn test_decoder_keeps_split_multibyte_characters() {
        let body = chunk("héllo");
        let bytes = body.as_bytes();
        let split = body.find('é').unwrap() + 1;
        let mut decoder = SseLineDecoder::new();

        let mut lines = decoder.push(&bytes[..split]);
        lines.extend(decoder.push(&bytes[split..]));
        assert_eq!(parse_line(&lines[0]), StreamEvent::Token("héllo".into()));
    }

    #[test]
    fn test_decoder_strips_carriage_returns() {
        let mut decoder = SseLineDecoder::new();
        let lines = decoder.push(b"data: [DONE]\r\n");
        assert_eq!(lines, vec!["data: [DONE]".to_string()]);
    }

    #[test]
    fn test_finish_returns_unterminated_line() {
        let mut decoder = SseLineDecoder::new();
        assert!(decoder.push(b"data: [DO").is_empty());
        assert!(decoder.push(b"NE]").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("data: [DONE]"));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_parse_done_and_non_data_lines() {
        assert_eq!(parse_line("data: [DONE]"), StreamEvent::Done);
        assert_eq!(parse_line("data:[DONE]"), StreamEvent::Done);
        assert_eq!(parse_line(""), StreamEvent::Skip);
        assert_eq!(parse_line(": keep-alive"), StreamEvent::Skip);
        assert_eq!(parse_line("event: message"), StreamEvent::Skip);
    }

    #[test]
    fn test_parse_skips_empty_and_missing_content() {
        assert_eq!(parse_line(chunk("").trim_end()), StreamEvent::Skip);
        assert_eq!(parse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#), StreamEvent::Skip);
        assert_eq!(parse_line(r#"data: {"choices":[],"usage":{"total_tokens":3}}"#), StreamEvent::Skip);
        assert_eq!(parse_line("data: {not json"), StreamEvent::Skip);
    }

    #[test]
    fn test_parse_in_band_error_frame() {
        assert_eq!(
            parse_line(r#"data: {"error": {"message": "Rate limit exceeded", "code": 429}}"#),
            StreamEvent::Error("Rate limit exceeded".into())
        );
        assert_eq!(
            parse_line(r#"data: {"error": "upstream overloaded"}"#),
            StreamEvent::Error("upstream overloaded".into())
        );
        assert_eq!(
            parse_line(r#"data: {"error": {"code": 500}}"#),
            StreamEvent::Error(r#"{"code":500}"#.into())
        );
        assert_eq!(
            parse_line(r#"data: {"error": null, "choices": [{"delta": {"content": "ok"}}]}"#),
            StreamEvent::Token("ok".into())
        );
    }
}
