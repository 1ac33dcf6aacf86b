//! Wire types for room events pushed to clients and guess responses.

use serde::{Deserialize, Serialize};

use crate::types::{PlayerId, PlayerSummary, RoomSettings};

/// Events fanned out to every client in a room. Serialized as
/// `{"event": "...", "data": {...}}` with camelCase payload fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum RoomEvent {
    /// A clue became the active clue
    #[serde(rename = "clue:new")]
    ClueNew {
        story: String,
        created_at: String,
        base_points: u32,
        difficulty: crate::types::Difficulty,
        clue_index: u32,
        total_clues: u32,
        timer_started_at: String,
    },

    /// A player scored; carries the full scoreboard
    #[serde(rename = "score:update")]
    ScoreUpdate {
        player_id: PlayerId,
        points: u32,
        players: Vec<PlayerSummary>,
    },

    /// Outcome of one guess, addressed to the room so everyone sees the
    /// progressively revealed sentence
    #[serde(rename = "guess:result")]
    GuessResult {
        player_id: PlayerId,
        correct: bool,
        matched_word: Option<String>,
        points: u32,
        sentence_with_blanks: String,
    },

    /// The queue ran out; the room is over
    #[serde(rename = "game:completed")]
    GameCompleted { message: String },

    #[serde(rename = "settings:update")]
    SettingsUpdate { settings: RoomSettings },

    #[serde(rename = "player:kicked")]
    PlayerKicked { player_id: PlayerId },
}

/// Progress snapshot for one player's view of the active clue
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceProgress {
    pub sentence_with_blanks: String,
    pub correct_guesses: Vec<String>,
    /// Count of words in the secret long enough to be blanked at all
    pub total_words: usize,
}

/// Direct HTTP response to the guessing player
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessOutcome {
    pub correct: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_word: Option<String>,
    pub points: u32,
    pub sentence_with_blanks: String,
    pub clue_completed: bool,
}
