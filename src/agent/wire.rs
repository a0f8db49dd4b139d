//! Request and response bodies of Gemini `generateContent`.
//!
//! Gemini calls messages "contents", names the assistant role `model`, and
//! keeps the system instruction outside the history.

use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::models::{Message, MessageRole};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { temperature: 0.7, top_k: 40, max_output_tokens: 8192 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// `{ "error": { "message": ... } }` returned alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()) }
    }
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Some("user".to_string()), parts: vec![Part::text(text)] }
    }
}

impl From<&Message> for Content {
    fn from(m: &Message) -> Self {
        let role = match m.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "model",
        };
        Self { role: Some(role.to_string()), parts: vec![Part::text(m.content.clone())] }
    }
}

impl GenerateRequest {
    pub fn chat(history: &[Message], system_instruction: &str) -> Self {
        Self {
            contents: history.iter().map(Content::from).collect(),
            system_instruction: Some(SystemInstruction {
                parts: vec![Part::text(system_instruction)],
            }),
            generation_config: Some(GenerationConfig::default()),
        }
    }

    pub fn prompt(text: impl Into<String>) -> Self {
        Self { contents: vec![Content::user(text)], system_instruction: None, generation_config: None }
    }
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, if non-empty.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
    }

    pub fn into_reply(self) -> Result<String, ApiError> {
        if let Some(text) = self.first_text() {
            return Ok(text.to_string());
        }
        match self.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => Err(ApiError::SafetyBlocked { reason }),
            None => Err(ApiError::EmptyReply),
        }
    }
}

/// Decodes a successful body into the reply text.
pub fn decode_reply(body: &str) -> Result<String, ApiError> {
    serde_json::from_str::<GenerateResponse>(body)
        .map_err(ApiError::MalformedResponse)?
        .into_reply()
}

/// Builds the error for a non-2xx status from whatever body came back.
pub fn decode_failure(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Request failed with status {status}"));
    ApiError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_request_matches_gemini_shape() {
        let history = vec![Message::user("Hello"), Message::assistant("Hi"), Message::user("Again")];
        let body = serde_json::to_value(GenerateRequest::chat(&history, "Be brief.")).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Hello"}]},
                    {"role": "model", "parts": [{"text": "Hi"}]},
                    {"role": "user", "parts": [{"text": "Again"}]}
                ],
                "systemInstruction": {"parts": [{"text": "Be brief."}]},
                "generationConfig": {"temperature": 0.7, "topK": 40, "maxOutputTokens": 8192}
            })
        );
    }

    #[test]
    fn prompt_request_sends_only_contents() {
        let body = serde_json::to_value(GenerateRequest::prompt("title please")).unwrap();
        assert_eq!(body, json!({"contents": [{"role": "user", "parts": [{"text": "title please"}]}]}));
    }

    #[test]
    fn reply_text_is_extracted() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hi there!"}]}}]}"#;
        assert_eq!(decode_reply(body).unwrap(), "Hi there!");
    }

    #[test]
    fn block_reason_is_reported_as_safety_block() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        match decode_reply(body) {
            Err(ApiError::SafetyBlocked { reason }) => assert_eq!(reason, "SAFETY"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_or_blank_text_is_empty_reply() {
        for body in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#,
        ] {
            assert!(matches!(decode_reply(body), Err(ApiError::EmptyReply)), "body: {body}");
        }
    }

    #[test]
    fn unparseable_body_is_malformed() {
        assert!(matches!(decode_reply("<html>"), Err(ApiError::MalformedResponse(_))));
        assert!(matches!(decode_reply(r#"{"candidates":{}}"#), Err(ApiError::MalformedResponse(_))));
    }

    #[test]
    fn failure_prefers_envelope_message() {
        let err = decode_failure(500, r#"{"error":{"code":500,"message":"overloaded"}}"#);
        assert_eq!(err.to_string(), "overloaded");

        let err = decode_failure(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Request failed with status 502");
    }
}
