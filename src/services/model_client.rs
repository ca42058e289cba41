use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("GEMINI_API_KEY is not set")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("No text in model reply")]
    EmptyReply,

    #[error("Failed to decode model reply: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One round trip to a hosted generative-language endpoint.
#[async_trait]
pub trait ModelClient: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        if self.api_key.is_empty() {
            return Err(ModelError::NotConfigured);
        }

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request_payload(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let reply: Value = serde_json::from_str(&body)?;
        reply_text(&reply).ok_or(ModelError::EmptyReply)
    }
}

fn request_payload(prompt: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }]
    })
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// First text part of the first candidate.
fn reply_text(reply: &Value) -> Option<String> {
    reply["candidates"][0]["content"]["parts"]
        .as_array()?
        .iter()
        .find_map(|part| part["text"].as_str())
        .map(str::to_string)
}

/// Replays canned replies in order; used by analyzer and handler tests.
#[cfg(test)]
pub struct ScriptedModel {
    replies: std::sync::Mutex<std::collections::VecDeque<Result<String, ModelError>>>,
    pub prompts: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedModel {
    pub fn replying(replies: Vec<Result<String, ModelError>>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn text(reply: &str) -> Self {
        Self::replying(vec![Ok(reply.to_string())])
    }
}

#[cfg(test)]
#[async_trait]
impl ModelClient for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ModelError::EmptyReply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_payload_shape() {
        let payload = request_payload("hello");
        assert_eq!(payload["contents"][0]["role"], "user");
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_reply_text_takes_first_text_part() {
        let reply = json!({
            "candidates": [{
                "content": { "parts": [{ "thought": true }, { "text": "{\"mood\":\"Happy\"}" }] }
            }]
        });
        assert_eq!(reply_text(&reply).as_deref(), Some("{\"mood\":\"Happy\"}"));
    }

    #[test]
    fn test_reply_text_missing_candidates() {
        let reply = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(reply_text(&reply), None);
    }

    #[test]
    fn test_api_error_message_prefers_error_field() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded"}}"#;
        assert_eq!(api_error_message(body), "Quota exceeded");
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = GeminiClient::new(
            "http://localhost:9999/",
            "gemini-flash-latest",
            "k",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-flash-latest:generateContent"
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = GeminiClient::new(
            "http://localhost:9999",
            "gemini-flash-latest",
            "  ",
            Duration::from_secs(1),
        )
        .unwrap();
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, ModelError::NotConfigured));
    }
}
