use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use crate::error::RemoteError;

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<String, RemoteError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(RemoteError::Malformed(match block_reason {
                Some(reason) => format!("prompt was blocked: {reason}"),
                None => "response contained no candidates".to_string(),
            }));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(RemoteError::Malformed(format!(
                "candidate contained no text (finish reason: {reason})"
            )));
        }

        Ok(text)
    }
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

pub struct GeminiClientBuilder {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl GeminiClientBuilder {
    pub fn model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<GeminiClient, RemoteError> {
        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(GeminiClient {
            client: builder.build()?,
            api_key: self.api_key,
            model: self.model,
            base_url: self.base_url,
        })
    }
}

impl GeminiClient {
    pub fn builder(api_key: Option<String>) -> GeminiClientBuilder {
        GeminiClientBuilder {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<String, RemoteError> {
        let api_key = self.api_key.as_deref().ok_or(RemoteError::MissingApiKey)?;
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "sending generateContent"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }

        let body = response.text().await?;
        let gemini_response: GeminiResponse =
            serde_json::from_str(&body).map_err(|e| RemoteError::Malformed(e.to_string()))?;
        gemini_response.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<String, RemoteError> {
        serde_json::from_str::<GeminiResponse>(json).unwrap().into_text()
    }

    #[test]
    fn test_parts_are_concatenated() {
        let text = parse(
            r#"{"candidates":[{
                "content":{"role":"model","parts":[{"text":"Hi "},{"text":"there!"}]},
                "finishReason":"STOP"
            }]}"#,
        )
        .unwrap();
        assert_eq!(text, "Hi there!");
    }

    #[test]
    fn test_blocked_prompt_is_malformed() {
        let err = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        match err {
            RemoteError::Malformed(msg) => assert!(msg.contains("SAFETY")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_candidate_without_text_is_malformed() {
        let err = parse(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#).unwrap_err();
        match err {
            RemoteError::Malformed(msg) => assert!(msg.contains("MAX_TOKENS")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_sending() {
        let client = GeminiClient::builder(None).build().unwrap();
        assert!(!client.has_api_key());
        assert!(matches!(
            client.generate_content("hello").await,
            Err(RemoteError::MissingApiKey)
        ));
    }
}
