//! Clue factory: turns a batch of plaintext secrets into sealed clues with
//! generated narratives, or fails the whole batch.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{GameError, GameResult};
use crate::llm::{StoryProvider, StoryRequest};
use crate::types::{Clue, Difficulty};
use crate::vault;
use crate::words;

const MAX_ATTEMPTS: u32 = 3;
const SECRET_MIN_CHARS: usize = 3;
const SECRET_MAX_CHARS: usize = 200;
const STORY_MIN_CHARS: usize = 50;
const STORY_MAX_CHARS: usize = 800;

/// Validate and trim a batch of secrets. All-or-nothing: one bad secret
/// rejects the whole batch and nothing is generated.
pub fn validate_secrets(secrets: &[String]) -> GameResult<Vec<String>> {
    if secrets.is_empty() {
        return Err(GameError::Validation("No secrets provided".to_string()));
    }
    let mut trimmed = Vec::with_capacity(secrets.len());
    for (idx, secret) in secrets.iter().enumerate() {
        let s = secret.trim();
        let chars = s.chars().count();
        if !(SECRET_MIN_CHARS..=SECRET_MAX_CHARS).contains(&chars) {
            return Err(GameError::Validation(format!(
                "Secret {} must be between {SECRET_MIN_CHARS} and {SECRET_MAX_CHARS} characters",
                idx + 1
            )));
        }
        trimmed.push(s.to_string());
    }
    Ok(trimmed)
}

/// Difficulty-weighted base score for a clue: floor(10 * multiplier) plus a
/// complexity bonus of one point per mapping entry, capped at 5
pub fn base_points(difficulty: Difficulty, mapping_len: usize) -> u32 {
    (10.0 * difficulty.multiplier() + mapping_len.min(5) as f64).floor() as u32
}

/// Ask the provider for a story, retrying on failure with exponential
/// backoff (2^attempt seconds). A reply only counts as success when the
/// story lands in the acceptable length band and the mapping is non-empty.
async fn generate_with_retry(
    provider: &dyn StoryProvider,
    secret: &str,
    difficulty: Difficulty,
    timeout: Duration,
) -> GameResult<(String, HashMap<String, String>)> {
    let mut last_error = String::new();

    for attempt in 1..=MAX_ATTEMPTS {
        let request = StoryRequest {
            secret: secret.to_string(),
            difficulty,
            timeout,
        };
        match provider.generate(request).await {
            Ok(output) => {
                let story = output.story.trim().to_string();
                let story_chars = story.chars().count();
                if !(STORY_MIN_CHARS..=STORY_MAX_CHARS).contains(&story_chars) {
                    last_error = format!("story length out of bounds ({story_chars} chars)");
                } else if output.mapping.is_empty() {
                    last_error = "generator returned an empty mapping".to_string();
                } else {
                    return Ok((story, output.mapping));
                }
            }
            Err(e) => last_error = e.to_string(),
        }

        tracing::warn!(attempt, provider = provider.name(), "story generation attempt failed: {last_error}");
        if attempt < MAX_ATTEMPTS {
            tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
        }
    }

    Err(GameError::Generation {
        attempts: MAX_ATTEMPTS,
        last_error,
    })
}

/// Generate one sealed clue per secret, sequentially. Fails the whole batch
/// on the first secret whose generation exhausts its retries; nothing is
/// returned for a partial batch.
pub async fn generate_clues(
    provider: &dyn StoryProvider,
    secrets: &[String],
    difficulty: Difficulty,
    room_key: &str,
    timeout: Duration,
) -> GameResult<Vec<Clue>> {
    let secrets = validate_secrets(secrets)?;
    let mut clues = Vec::with_capacity(secrets.len());

    for secret in &secrets {
        let (story, raw_mapping) =
            generate_with_retry(provider, secret, difficulty, timeout).await?;
        let mapping = words::filter_important_mapping(&raw_mapping);

        clues.push(Clue {
            story,
            mapping_encrypted: vault::seal(&mapping, room_key)?,
            original_secret_encrypted: Some(vault::seal(secret, room_key)?),
            base_points: base_points(difficulty, mapping.len()),
            created_at: chrono::Utc::now().to_rfc3339(),
            timer_started_at: None,
            is_completed: false,
        });
    }

    Ok(clues)
}
