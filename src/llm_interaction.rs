use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::constants;
use crate::conversation::{Role, Turn};
use crate::error::LlmError;

/// Sampling settings applied to every main model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: constants::DEFAULT_TEMPERATURE,
            max_output_tokens: constants::DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// A hosted model that turns an ordered turn history into one completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// `config` of `None` leaves sampling to the provider defaults.
    async fn generate(
        &self,
        turns: &[Turn],
        config: Option<&GenerationConfig>,
    ) -> Result<String, LlmError>;
}

// Structures matching Gemini's :generateContent endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: Role,
    parts: [GeminiPart<'a>; 1],
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize, Debug)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Deserialize, Debug)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Client for Google's Generative Language API.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(
            api_key,
            constants::GEMINI_API_BASE.clone(),
            constants::GAMKERS_MODEL.clone(),
        )
    }

    pub fn with_endpoint(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    #[instrument(skip(self, turns, config), fields(model = %self.model, turns = turns.len()))]
    async fn generate(
        &self,
        turns: &[Turn],
        config: Option<&GenerationConfig>,
    ) -> Result<String, LlmError> {
        let request_payload = GeminiRequest {
            contents: turns
                .iter()
                .map(|turn| GeminiContent {
                    role: turn.role,
                    parts: [GeminiPart { text: &turn.text }],
                })
                .collect(),
            generation_config: config.map(|c| GeminiGenerationConfig {
                temperature: c.temperature,
                max_output_tokens: c.max_output_tokens,
            }),
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(classify_failure(status, error_body));
        }

        let gemini_response = response.json::<GeminiResponse>().await?;

        let text: String = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            warn!("Gemini returned no candidate text");
            return Err(LlmError::EmptyResponse);
        }

        debug!(chars = text.len(), "Received Gemini response");
        Ok(text)
    }
}

fn classify_failure(status: StatusCode, error_body: String) -> LlmError {
    let envelope = serde_json::from_str::<GeminiErrorEnvelope>(&error_body).ok();

    if status == StatusCode::TOO_MANY_REQUESTS
        || envelope.as_ref().is_some_and(|e| e.error.status == "RESOURCE_EXHAUSTED")
    {
        warn!(%status, "Gemini quota exhausted");
        return LlmError::RateLimited;
    }

    error!(%status, %error_body, "Gemini API request failed");
    let message = match envelope {
        Some(e) if !e.error.message.is_empty() => e.error.message,
        _ => error_body,
    };
    LlmError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let turns = [Turn::user("hi"), Turn::model("hello")];
        let payload = GeminiRequest {
            contents: turns
                .iter()
                .map(|t| GeminiContent {
                    role: t.role,
                    parts: [GeminiPart { text: &t.text }],
                })
                .collect(),
            generation_config: Some(GeminiGenerationConfig {
                temperature: 0.5,
                max_output_tokens: 10,
            }),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 10);
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_generation_config_omitted_when_none() {
        let payload = GeminiRequest {
            contents: Vec::new(),
            generation_config: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_classify_resource_exhausted_as_rate_limit() {
        let body =
            r#"{"error":{"code":403,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(classify_failure(StatusCode::FORBIDDEN, body.to_string()).is_rate_limited());
        assert!(classify_failure(StatusCode::TOO_MANY_REQUESTS, String::new()).is_rate_limited());
    }

    #[test]
    fn test_classify_other_failure_keeps_message() {
        let body =
            r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        match classify_failure(StatusCode::BAD_REQUEST, body.to_string()) {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_default_generation_config() {
        let config = GenerationConfig::default();
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_output_tokens, 2048);
    }
}
