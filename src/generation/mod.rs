use async_trait::async_trait;

pub mod gemini;
pub mod title;

pub use gemini::GeminiClient;
pub use title::generate_title;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("The AI model is not configured")]
    ModelUnconfigured,
    #[error("The AI model returned an empty response")]
    EmptyResponse,
    #[error("Content was blocked by the model's safety filters: {0}")]
    SafetyBlocked(String),
    #[error("The AI service quota has been exceeded: {0}")]
    QuotaExceeded(String),
    #[error("Model request failed: {0}")]
    Upstream(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Translate an upstream failure message into the error taxonomy.
///
/// The model API reports safety and quota conditions only in free text, so this
/// is the single place that inspects message wording.
pub fn classify_failure(message: &str) -> GenerationError {
    let lowered = message.to_ascii_lowercase();
    // A bare "blocked" also appears in API-key restriction errors
    let safety = lowered.contains("safety")
        || lowered.contains("blockreason")
        || lowered.starts_with("prompt blocked:")
        || lowered.starts_with("response blocked:");
    if safety {
        GenerationError::SafetyBlocked(message.to_string())
    } else if lowered.contains("quota")
        || lowered.contains("resource_exhausted")
        || lowered.contains("resource has been exhausted")
    {
        GenerationError::QuotaExceeded(message.to_string())
    } else {
        GenerationError::Upstream(message.to_string())
    }
}

/// Sampling configuration for one model call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            top_p: DEFAULT_TOP_P,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl GenerationParams {
    /// Build parameters from optional caller overrides, clamped into safe ranges
    pub fn clamped(temperature: Option<f32>, max_output_tokens: Option<u32>) -> Self {
        let temperature = temperature
            .filter(|t| t.is_finite())
            .map(|t| t.clamp(0.0, MAX_TEMPERATURE))
            .unwrap_or(DEFAULT_TEMPERATURE);
        let max_output_tokens = max_output_tokens
            .map(|m| m.clamp(1, DEFAULT_MAX_OUTPUT_TOKENS))
            .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS);

        Self {
            temperature,
            max_output_tokens,
            ..Self::default()
        }
    }

    /// Low-budget configuration used for title generation
    pub fn title() -> Self {
        Self {
            temperature: 0.5,
            max_output_tokens: 50,
            ..Self::default()
        }
    }
}

/// Single-turn text completion service
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError>;
}

/// Run one completion, rejecting whitespace-only output
pub async fn generate_document(
    generator: &dyn TextGenerator,
    prompt: &str,
    params: &GenerationParams,
) -> Result<String, GenerationError> {
    let text = generator.generate(prompt, params).await?;
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}
