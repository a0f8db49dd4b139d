pub mod wire;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::errors::ApiError;
use crate::models::{Message, PLACEHOLDER_TITLE};

use self::wire::{decode_failure, decode_reply, GenerateRequest};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

const TITLE_PROMPT: &str =
    "Generate a short, concise title (3-5 words) for this conversation based on its main topic.";

/// Boundary to the remote text-generation service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends the whole `history` and returns the reply text.
    async fn complete(
        &self,
        history: &[Message],
        system_instruction: &str,
        api_key: &str,
    ) -> Result<String, ApiError>;

    /// Best effort: any failure yields [`PLACEHOLDER_TITLE`].
    async fn suggest_title(&self, user: &Message, assistant: &Message, api_key: &str) -> String;
}

/// [`CompletionClient`] backed by Gemini's `generateContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, request: &GenerateRequest, api_key: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini request to model {} failed: {e}", self.model);
                ApiError::Network(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::Network)?;

        if !status.is_success() {
            let err = decode_failure(status.as_u16(), &body);
            error!("Gemini returned {status}: {err}");
            return Err(err);
        }

        decode_reply(&body).inspect_err(|e| error!("Unusable Gemini reply: {e}"))
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(
        &self,
        history: &[Message],
        system_instruction: &str,
        api_key: &str,
    ) -> Result<String, ApiError> {
        debug!("Sending {} messages to {}", history.len(), self.model);
        self.generate(&GenerateRequest::chat(history, system_instruction), api_key)
            .await
    }

    async fn suggest_title(&self, user: &Message, assistant: &Message, api_key: &str) -> String {
        let transcript = [user, assistant]
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!("{TITLE_PROMPT}\n\nConversation:\n{transcript}");

        match self.generate(&GenerateRequest::prompt(prompt), api_key).await {
            Ok(raw) => clean_title(&raw),
            Err(e) => {
                warn!("Title suggestion failed, keeping placeholder: {e}");
                PLACEHOLDER_TITLE.to_string()
            }
        }
    }
}

/// Trims the suggestion and drops double quotes; blank becomes the placeholder.
pub fn clean_title(raw: &str) -> String {
    let title = raw.trim().replace('"', "");
    if title.trim().is_empty() {
        PLACEHOLDER_TITLE.to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_title_strips_quotes_and_whitespace() {
        assert_eq!(clean_title("  \"Rust Borrow Checker Basics\"\n"), "Rust Borrow Checker Basics");
        assert_eq!(clean_title(" \"\" "), PLACEHOLDER_TITLE);
        assert_eq!(clean_title(""), PLACEHOLDER_TITLE);
    }

    #[test]
    fn endpoint_targets_generate_content() {
        let client = GeminiClient::new("http://localhost:9999/", "gemini-test");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
    }
}
