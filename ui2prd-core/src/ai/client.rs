//! AI Client Module
//!
//! Handles communication with the vision model over the Generative Language
//! REST API.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::config::AppConfig;
use crate::image::{ImageError, ImagePayload};

/// Errors that can occur during AI operations
#[derive(Error, Debug)]
pub enum AiError {
    #[error("API key missing")]
    MissingCredential,

    #[error("API key rejected: {0}")]
    InvalidCredential(String),

    #[error("Empty response from AI")]
    EmptyResponse,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Invalid response from AI: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Image(#[from] ImageError),
}

impl AiError {
    /// True when the user should be asked for a (new) API key
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            AiError::MissingCredential | AiError::InvalidCredential(_)
        )
    }
}

/// Everything the vision model needs for one call
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    pub api_key: &'a str,
    pub prompt: &'a str,
    pub image: &'a ImagePayload,
    pub response_schema: &'a serde_json::Value,
}

/// A vision-language model that answers a prompt about an image with text
pub trait VisionClient: Send + Sync {
    fn generate(&self, request: &VisionRequest<'_>) -> Result<String, AiError>;

    /// Short description for logs and status lines
    fn describe(&self) -> String;
}

/// Client for Gemini's `generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_base: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(api_base: &str, model: &str, timeout_secs: u64) -> Result<Self, AiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AiError> {
        Self::new(&config.api_base, &config.model, config.timeout_secs)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }
}

/// Request body for `models/{model}:generateContent`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a serde_json::Value,
}

/// Response body from `generateContent`
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request_body<'a>(request: &VisionRequest<'a>) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part {
                    text: Some(request.prompt),
                    inline_data: None,
                },
                Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: request.image.mime_type(),
                        data: request.image.to_base64(),
                    }),
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: request.response_schema,
        },
    }
}

/// Maps a non-success HTTP status to an error
fn classify_status(status: u16, body: String) -> AiError {
    let mentions_key = body.to_lowercase().contains("api key");
    match status {
        401 | 403 => AiError::InvalidCredential(body),
        400 if mentions_key => AiError::InvalidCredential(body),
        429 => AiError::RateLimited,
        _ => AiError::Api { status, body },
    }
}

/// Concatenates the text parts of the first candidate
fn candidate_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

impl VisionClient for GeminiClient {
    fn generate(&self, request: &VisionRequest<'_>) -> Result<String, AiError> {
        if request.api_key.trim().is_empty() {
            return Err(AiError::MissingCredential);
        }

        let body = build_request_body(request);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", request.api_key.trim())
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout(self.timeout_secs)
                } else {
                    AiError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        Ok(candidate_text(parsed))
    }

    fn describe(&self) -> String {
        format!("Gemini ({})", self.model)
    }
}

/// A request captured by [`MockVisionClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub prompt: String,
    pub mime_type: String,
    pub had_api_key: bool,
}

/// Vision client returning scripted replies, for tests and offline demos
///
/// Replies are consumed in order; once exhausted every call returns an
/// empty string.
#[derive(Debug, Default)]
pub struct MockVisionClient {
    replies: Mutex<VecDeque<Result<String, AiError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockVisionClient {
    pub fn new(response: &str) -> Self {
        Self::default().with_reply(Ok(response.to_string()))
    }

    pub fn failing(error: AiError) -> Self {
        Self::default().with_reply(Err(error))
    }

    pub fn with_reply(self, reply: Result<String, AiError>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl VisionClient for MockVisionClient {
    fn generate(&self, request: &VisionRequest<'_>) -> Result<String, AiError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                prompt: request.prompt.to_string(),
                mime_type: request.image.mime_type().to_string(),
                had_api_key: !request.api_key.is_empty(),
            });
        }

        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Ok(String::new()))
    }

    fn describe(&self) -> String {
        "Mock".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::DEFAULT_MAX_IMAGE_BYTES;
    use serde_json::json;

    fn png() -> ImagePayload {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        ImagePayload::from_bytes(bytes, DEFAULT_MAX_IMAGE_BYTES).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let image = png();
        let schema = json!({"type": "ARRAY"});
        let request = VisionRequest {
            api_key: "key",
            prompt: "describe",
            image: &image,
            response_schema: &schema,
        };

        let body = serde_json::to_value(build_request_body(&request)).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "describe");
        assert!(parts[0].get("inlineData").is_none());
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], image.to_base64());
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
    }

    #[test]
    fn test_candidate_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "[{\"region\""}, {"text": ": \"Nav\"}]"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(candidate_text(response), "[{\"region\": \"Nav\"}]");

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(candidate_text(empty), "");
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(400, "API key not valid. Please pass a valid API key.".into())
            .is_credential_error());
        assert!(classify_status(403, "forbidden".into()).is_credential_error());
        assert!(matches!(classify_status(429, String::new()), AiError::RateLimited));
        assert!(matches!(
            classify_status(500, "boom".into()),
            AiError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_gemini_rejects_blank_key_without_request() {
        let client = GeminiClient::new("http://127.0.0.1:9", "gemini-2.5-flash", 1).unwrap();
        let image = png();
        let schema = json!({});
        let request = VisionRequest {
            api_key: "  ",
            prompt: "p",
            image: &image,
            response_schema: &schema,
        };
        assert!(matches!(
            client.generate(&request),
            Err(AiError::MissingCredential)
        ));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("https://example.test/", "gemini-2.5-flash", 5).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(client.describe(), "Gemini (gemini-2.5-flash)");
    }

    #[test]
    fn test_mock_replays_in_order() {
        let mock = MockVisionClient::new("first").with_reply(Err(AiError::RateLimited));
        let image = png();
        let schema = json!({});
        let request = VisionRequest {
            api_key: "k",
            prompt: "p",
            image: &image,
            response_schema: &schema,
        };

        assert_eq!(mock.generate(&request).unwrap(), "first");
        assert!(matches!(mock.generate(&request), Err(AiError::RateLimited)));
        assert_eq!(mock.generate(&request).unwrap(), "");
        assert_eq!(mock.requests().len(), 3);
        assert!(mock.requests()[0].had_api_key);
    }
}
