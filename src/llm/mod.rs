mod openai;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::types::Difficulty;

pub use openai::OpenAiStoryteller;

/// Result type for narrative generation
pub type NarrativeResult<T> = Result<T, NarrativeError>;

/// Errors that can occur while talking to the narrative generator
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

/// Request to weave one secret into a story
#[derive(Debug, Clone)]
pub struct StoryRequest {
    /// The plaintext secret to disguise
    pub secret: String,
    pub difficulty: Difficulty,
    /// Timeout for the request
    pub timeout: Duration,
}

/// Parsed generator output: the narrative plus the substitution map it used
#[derive(Debug, Clone, Deserialize)]
pub struct StoryOutput {
    pub story: String,
    /// Original word -> replacement phrase used in the story
    pub mapping: HashMap<String, String>,
}

/// Trait for narrative story providers
#[async_trait]
pub trait StoryProvider: Send + Sync {
    /// Generate a story that hides the request's secret
    async fn generate(&self, request: StoryRequest) -> NarrativeResult<StoryOutput>;

    /// Get the name of this provider
    fn name(&self) -> &str;
}

/// Build the generation prompt for one secret at a given difficulty.
/// The important words are listed explicitly so the model knows which
/// words it must disguise.
pub fn build_story_prompt(secret: &str, difficulty: Difficulty) -> String {
    let important_words = crate::words::extract_important_words(secret);

    let difficulty_instructions = match difficulty {
        Difficulty::Easy => {
            "Use direct, fairly obvious substitutions. A reader should be able \
             to guess the hidden words without much effort."
        }
        Difficulty::Medium => {
            "Use metaphor and allegory. The substitutions should take some \
             thought to see through, but stay fair."
        }
        Difficulty::Hard => {
            "Use abstract, layered wordplay. The substitutions should be \
             oblique and demand real lateral thinking."
        }
    };

    format!(
        "You are a storyteller for a word-guessing party game. Rewrite the \
         secret message below as a short fantasy story of roughly 200-400 \
         characters. Every important word of the secret must be replaced by \
         an evocative phrase; never include an important word verbatim.\n\
         {difficulty_instructions}\n\n\
         Secret message: {secret}\n\
         Important words to disguise: {}\n\n\
         Respond with JSON only, no prose around it:\n\
         {{\"story\": \"...\", \"mapping\": {{\"original word\": \"replacement phrase\", ...}}}}",
        important_words.join(", ")
    )
}

/// Parse the generator's JSON reply, tolerating markdown code fences
pub fn parse_story_json(raw: &str) -> NarrativeResult<StoryOutput> {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.strip_suffix("```").unwrap_or(s))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(stripped).map_err(|e| NarrativeError::ParseError(e.to_string()))
}

/// Configuration for the narrative generator
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// OpenAI model to use
    pub openai_model: String,
    /// Default timeout for generation requests
    pub default_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            default_timeout: Duration::from_secs(30),
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok().and_then(|key| {
            let trimmed = key.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

        let openai_model = std::env::var("OPENAI_MODEL")
            .ok()
            .and_then(|model| {
                let trimmed = model.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| "gpt-4o-mini".to_string());

        Self {
            openai_api_key,
            openai_model,
            default_timeout: std::env::var("LLM_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(30)),
        }
    }

    /// Build a provider if an API key is configured
    pub fn build_provider(&self) -> NarrativeResult<Arc<dyn StoryProvider>> {
        let api_key = self.openai_api_key.as_ref().ok_or_else(|| {
            NarrativeError::ConfigError(
                "No story provider configured. Set OPENAI_API_KEY".to_string(),
            )
        })?;

        Ok(Arc::new(OpenAiStoryteller::new(
            api_key.clone(),
            self.openai_model.clone(),
        )))
    }
}
