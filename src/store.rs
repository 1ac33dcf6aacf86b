//! Room persistence behind a trait so state logic stays storage-agnostic.
//! Rooms are stored as JSON values and hydrated on every read, which lets
//! records written by older versions gain newer fields lazily.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{GameError, GameResult};
use crate::types::Room;

#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Load and hydrate a room; Ok(None) when the code is unknown
    async fn find_room(&self, code: &str) -> GameResult<Option<Room>>;

    async fn insert_room(&self, room: &Room) -> GameResult<()>;

    async fn save_room(&self, room: &Room) -> GameResult<()>;
}

/// Upgrade a stored room record in place. Serde defaults cover absent
/// fields; the one non-default repair is backfilling `timerStartedAt` on an
/// active clue so score decay has an anchor.
pub fn hydrate_room(mut value: Value) -> GameResult<Room> {
    if let Some(clue) = value.get_mut("currentClue").filter(|c| !c.is_null()) {
        let missing_timer = clue
            .get("timerStartedAt")
            .map(Value::is_null)
            .unwrap_or(true);
        if missing_timer {
            if let Some(created_at) = clue.get("createdAt").cloned() {
                clue["timerStartedAt"] = created_at;
            }
        }
    }

    serde_json::from_value(value)
        .map_err(|e| GameError::NotFound(format!("stored room is unreadable: {e}")))
}

/// In-memory store keyed by room code
#[derive(Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn find_room(&self, code: &str) -> GameResult<Option<Room>> {
        let rooms = self.rooms.read().await;
        match rooms.get(code) {
            Some(value) => Ok(Some(hydrate_room(value.clone())?)),
            None => Ok(None),
        }
    }

    async fn insert_room(&self, room: &Room) -> GameResult<()> {
        let value = serde_json::to_value(room)
            .map_err(|e| GameError::Validation(format!("room not serializable: {e}")))?;
        self.rooms.write().await.insert(room.code.clone(), value);
        Ok(())
    }

    async fn save_room(&self, room: &Room) -> GameResult<()> {
        self.insert_room(room).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Player, Room, RoomStatus};
    use serde_json::json;

    #[tokio::test]
    async fn roundtrips_a_room() {
        let store = MemoryStore::new();
        let room = Room::new(Player::new("alice".to_string()), "key".to_string());
        store.insert_room(&room).await.unwrap();

        let loaded = store.find_room(&room.code).await.unwrap().unwrap();
        assert_eq!(loaded.code, room.code);
        assert_eq!(loaded.status, RoomStatus::Lobby);

        assert!(store.find_room("NOPE1234").await.unwrap().is_none());
    }

    #[test]
    fn hydrates_legacy_records() {
        // A record from before per-clue timers, per-player guess tracking
        // and the sealed original secret existed
        let legacy = json!({
            "code": "ABCDEFGH",
            "adminId": "p1",
            "roomKey": "old-key",
            "players": [
                {"id": "p1", "name": "alice", "score": 4, "joinedAt": "2024-01-01T00:00:00Z"}
            ],
            "currentClue": {
                "story": "A tale of the elder sentinel.",
                "mappingEncrypted": {"iv": "aWl2", "ciphertext": "Y3Q="},
                "basePoints": 12,
                "createdAt": "2024-01-01T00:05:00Z"
            },
            "status": "playing",
            "settings": {
                "timerSeconds": 60,
                "decayRate": 1,
                "difficulty": "easy",
                "allowSuggestions": true
            },
            "createdAt": "2024-01-01T00:00:00Z"
        });

        let room = hydrate_room(legacy).unwrap();
        let clue = room.current_clue.unwrap();
        // Timer anchored to creation time so decay still works
        assert_eq!(clue.timer_started_at.as_deref(), Some("2024-01-01T00:05:00Z"));
        assert!(clue.original_secret_encrypted.is_none());
        assert!(!clue.is_completed);
        assert!(room.players[0].correct_guesses.is_empty());
        assert!(room.clue_queue.is_empty());
        assert_eq!(room.current_clue_index, 0);
        assert!(!room.settings.no_time_limit);
    }

    #[test]
    fn hydration_leaves_present_timers_alone() {
        let mut room = Room::new(Player::new("a".to_string()), "k".to_string());
        room.current_clue = Some(crate::types::Clue {
            story: "s".repeat(60),
            mapping_encrypted: crate::vault::SealedEnvelope {
                iv: "aWl2".to_string(),
                ciphertext: "Y3Q=".to_string(),
            },
            original_secret_encrypted: None,
            base_points: 10,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            timer_started_at: Some("2024-01-01T00:09:00Z".to_string()),
            is_completed: false,
        });

        let value = serde_json::to_value(&room).unwrap();
        let hydrated = hydrate_room(value).unwrap();
        assert_eq!(
            hydrated.current_clue.unwrap().timer_started_at.as_deref(),
            Some("2024-01-01T00:09:00Z")
        );
    }
}
