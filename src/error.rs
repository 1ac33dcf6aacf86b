use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors surfaced by the clue lifecycle and room operations.
///
/// Every variant maps to a stable machine-checkable `kind` plus a
/// human-readable message; none of them ever carries the room key or a
/// decrypted secret.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Malformed or out-of-range input; no state change
    #[error("{0}")]
    Validation(String),

    /// No authenticated player identity on the request
    #[error("{0}")]
    Unauthenticated(String),

    /// Room, player, or clue absent
    #[error("{0}")]
    NotFound(String),

    /// Admin-only action by a non-admin, or advance without eligibility
    #[error("{0}")]
    Forbidden(String),

    /// Sealed data unreadable: key mismatch or corruption. Logged for
    /// investigation; reported separately from validation failures.
    #[error("failed to open sealed data: {0}")]
    Decryption(String),

    /// Narrative generator exhausted its retries; carries the last cause.
    /// No partial clue batch is committed when this is returned.
    #[error("story generation failed after {attempts} attempts: {last_error}")]
    Generation { attempts: u32, last_error: String },
}

impl GameError {
    /// Stable machine-checkable kind for clients
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::Validation(_) => "validation",
            GameError::Unauthenticated(_) => "unauthenticated",
            GameError::NotFound(_) => "not_found",
            GameError::Forbidden(_) => "forbidden",
            GameError::Decryption(_) => "decryption",
            GameError::Generation { .. } => "generation_failed",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            GameError::Validation(_) => StatusCode::BAD_REQUEST,
            GameError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::Forbidden(_) => StatusCode::FORBIDDEN,
            GameError::Decryption(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GameError::Generation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        // Server-side failures get logged; client mistakes stay at debug
        match &self {
            GameError::Decryption(_) | GameError::Generation { .. } => {
                tracing::error!(kind = self.kind(), "{}", self);
            }
            _ => tracing::debug!(kind = self.kind(), "{}", self),
        }

        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(GameError::Validation("x".into()).kind(), "validation");
        assert_eq!(GameError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(GameError::Forbidden("x".into()).kind(), "forbidden");
        assert_eq!(GameError::Decryption("x".into()).kind(), "decryption");
        assert_eq!(
            GameError::Generation {
                attempts: 3,
                last_error: "boom".into()
            }
            .kind(),
            "generation_failed"
        );
    }

    #[test]
    fn generation_message_carries_last_cause() {
        let err = GameError::Generation {
            attempts: 3,
            last_error: "story length out of bounds".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("after 3 attempts"));
        assert!(msg.contains("story length out of bounds"));
    }
}
