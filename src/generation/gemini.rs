use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{classify_failure, GenerationError, GenerationParams, TextGenerator};
use crate::config::GeminiSettings;

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    http: Client,
    api_key: Secret<String>,
    endpoint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

impl GeminiClient {
    /// Returns `None` when no API key is configured
    pub fn from_settings(settings: &GeminiSettings) -> Result<Option<Self>, GenerationError> {
        let Some(api_key) = settings.api_key.clone() else {
            return Ok(None);
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Some(Self {
            http,
            api_key,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                settings.api_url, settings.model
            ),
        }))
    }
}

/// Extract generated text, or translate the reason there is none
fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(classify_failure(&format!("Prompt blocked: {}", reason)));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GenerationError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason == "SAFETY" || reason == "BLOCKLIST" || reason == "PROHIBITED_CONTENT" {
                return Err(classify_failure(&format!("Response blocked: {}", reason)));
            }
        }
        return Err(GenerationError::EmptyResponse);
    }

    Ok(text)
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!(
            "[{}] {}",
            envelope.error.status.unwrap_or_else(|| status.to_string()),
            envelope.error.message.unwrap_or_default()
        ),
        Err(_) => format!("[{}] {}", status, body),
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                top_k: params.top_k,
                top_p: params.top_p,
                max_output_tokens: params.max_output_tokens,
            },
        };

        debug!(prompt_len = prompt.len(), "Sending generation request");
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(&error_message(status, &text)));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        if let Some(tokens) = parsed.usage_metadata.as_ref().and_then(|u| u.total_token_count) {
            info!(tokens_used = tokens, "Gemini AI request");
        }
        extract_text(parsed)
    }
}
