use crate::vault::SealedEnvelope;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type RoomCode = String;

/// Room code alphabet (excludes 0/O and 1/I to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 8;

/// Generate a random 8-character room code
pub fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Point multiplier used by the clue factory
    pub fn multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.5,
            Difficulty::Hard => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Lobby,
    Playing,
    Ended,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    /// Per-clue time budget in seconds (ignored when no_time_limit is set)
    pub timer_seconds: u32,
    /// Seconds per one point of score decay
    pub decay_rate: u32,
    pub difficulty: Difficulty,
    pub allow_suggestions: bool,
    /// When true, the next clue appears only once the current one is solved
    #[serde(default)]
    pub no_time_limit: bool,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            timer_seconds: 60,
            decay_rate: 1,
            difficulty: Difficulty::Medium,
            allow_suggestions: true,
            no_time_limit: false,
        }
    }
}

/// Admin-submitted partial settings update; unset fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub timer_seconds: Option<u32>,
    pub decay_rate: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub allow_suggestions: Option<bool>,
    pub no_time_limit: Option<bool>,
}

impl RoomSettings {
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.timer_seconds {
            self.timer_seconds = v;
        }
        if let Some(v) = patch.decay_rate {
            self.decay_rate = v;
        }
        if let Some(v) = patch.difficulty {
            self.difficulty = v;
        }
        if let Some(v) = patch.allow_suggestions {
            self.allow_suggestions = v;
        }
        if let Some(v) = patch.no_time_limit {
            self.no_time_limit = v;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub joined_at: String,
    /// Important words this player has matched for the *active* clue only;
    /// cleared every time a new clue activates
    #[serde(default)]
    pub correct_guesses: Vec<String>,
}

impl Player {
    pub fn new(name: String) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            name,
            score: 0,
            joined_at: chrono::Utc::now().to_rfc3339(),
            correct_guesses: Vec::new(),
        }
    }
}

/// One narrative plus its sealed answer key. Immutable once created except
/// for activation (`timer_started_at`) and completion (`is_completed`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clue {
    /// Plaintext narrative, safe to expose to clients
    pub story: String,
    /// Sealed word -> fantasy-token substitution map
    pub mapping_encrypted: SealedEnvelope,
    /// Sealed plaintext secret, the ground truth for guess matching.
    /// Clues persisted before this field existed lack it and are unguessable.
    #[serde(default)]
    pub original_secret_encrypted: Option<SealedEnvelope>,
    pub base_points: u32,
    pub created_at: String,
    /// Set when the clue becomes the active clue
    #[serde(default)]
    pub timer_started_at: Option<String>,
    /// True once the room has collectively guessed every important word
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: RoomCode,
    pub admin_id: PlayerId,
    /// Per-room symmetric key. Never exposed to clients; every read API goes
    /// through `RoomView`, which structurally omits this field.
    pub room_key: String,
    pub players: Vec<Player>,
    #[serde(default)]
    pub current_clue: Option<Clue>,
    /// Clues waiting to be revealed, FIFO
    #[serde(default)]
    pub clue_queue: Vec<Clue>,
    /// Count of clues already activated (progress display)
    #[serde(default)]
    pub current_clue_index: u32,
    pub status: RoomStatus,
    pub settings: RoomSettings,
    pub created_at: String,
}

impl Room {
    pub fn new(admin: Player, room_key: String) -> Self {
        Self {
            code: generate_room_code(),
            admin_id: admin.id.clone(),
            room_key,
            players: vec![admin],
            current_clue: None,
            clue_queue: Vec::new(),
            current_clue_index: 0,
            status: RoomStatus::Lobby,
            settings: RoomSettings::default(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_admin(&self, player_id: &str) -> bool {
        self.admin_id == player_id
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Total clues ever generated that haven't been discarded:
    /// activated + queued + the active one
    pub fn total_clues(&self) -> u32 {
        self.current_clue_index
            + self.clue_queue.len() as u32
            + u32::from(self.current_clue.is_some())
    }

    /// Reset every player's per-clue progress (called on clue activation)
    pub fn reset_correct_guesses(&mut self) {
        for p in &mut self.players {
            p.correct_guesses.clear();
        }
    }
}

/// Client-facing room projection. Structurally excludes `room_key` so no read
/// path can leak it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub code: RoomCode,
    pub admin_id: PlayerId,
    pub players: Vec<Player>,
    pub current_clue: Option<Clue>,
    pub clue_queue: Vec<Clue>,
    pub current_clue_index: u32,
    pub status: RoomStatus,
    pub settings: RoomSettings,
    pub created_at: String,
}

impl From<&Room> for RoomView {
    fn from(room: &Room) -> Self {
        Self {
            code: room.code.clone(),
            admin_id: room.admin_id.clone(),
            players: room.players.clone(),
            current_clue: room.current_clue.clone(),
            clue_queue: room.clue_queue.clone(),
            current_clue_index: room.current_clue_index,
            status: room.status,
            settings: room.settings.clone(),
            created_at: room.created_at.clone(),
        }
    }
}

/// Redacted player entry carried in score broadcasts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
}

impl From<&Player> for PlayerSummary {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            score: p.score,
        }
    }
}
