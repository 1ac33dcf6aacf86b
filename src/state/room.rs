use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::RoomEvent;
use crate::types::{Player, Room, RoomView, SettingsPatch};
use crate::vault;

impl AppState {
    /// Load a room or fail with NotFound
    pub(crate) async fn require_room(&self, code: &str) -> GameResult<Room> {
        self.store
            .find_room(code)
            .await?
            .ok_or_else(|| GameError::NotFound(format!("Room {code} not found")))
    }

    /// Create a room with the caller as admin. The per-room key is minted
    /// here and never leaves the server.
    pub async fn create_room(&self, admin_name: &str) -> GameResult<(RoomView, String)> {
        let name = valid_name(admin_name)?;
        let admin = Player::new(name);
        let admin_id = admin.id.clone();
        let room = Room::new(admin, vault::generate_room_key());
        self.store.insert_room(&room).await?;

        tracing::info!(room = %room.code, "room created");
        Ok((RoomView::from(&room), admin_id))
    }

    /// Join a room by code. A player whose name already exists in the room
    /// is re-attached to that seat instead of getting a duplicate.
    pub async fn join_room(&self, code: &str, player_name: &str) -> GameResult<(RoomView, String)> {
        let name = valid_name(player_name)?;
        let mut room = self.require_room(code).await?;

        let player_id = match room.players.iter().find(|p| p.name == name) {
            Some(existing) => existing.id.clone(),
            None => {
                let player = Player::new(name);
                let id = player.id.clone();
                room.players.push(player);
                self.store.save_room(&room).await?;
                id
            }
        };

        Ok((RoomView::from(&room), player_id))
    }

    pub async fn room_state(&self, code: &str) -> GameResult<RoomView> {
        let room = self.require_room(code).await?;
        Ok(RoomView::from(&room))
    }

    /// Admin removes a player. Kicking yourself is not allowed; transfer the
    /// room instead of orphaning it.
    pub async fn kick_player(
        &self,
        code: &str,
        requester_id: &str,
        target_id: &str,
    ) -> GameResult<RoomView> {
        let mut room = self.require_room(code).await?;
        if !room.is_admin(requester_id) {
            return Err(GameError::Forbidden(
                "Only the admin can kick players".to_string(),
            ));
        }
        if requester_id == target_id {
            return Err(GameError::Validation(
                "The admin cannot kick themselves".to_string(),
            ));
        }
        let before = room.players.len();
        room.players.retain(|p| p.id != target_id);
        if room.players.len() == before {
            return Err(GameError::NotFound(format!(
                "Player {target_id} not in room"
            )));
        }
        self.store.save_room(&room).await?;

        self.broadcaster.publish(
            code,
            RoomEvent::PlayerKicked {
                player_id: target_id.to_string(),
            },
        );
        Ok(RoomView::from(&room))
    }

    /// Admin updates room settings; unset patch fields keep their value
    pub async fn update_settings(
        &self,
        code: &str,
        requester_id: &str,
        patch: SettingsPatch,
    ) -> GameResult<RoomView> {
        let mut room = self.require_room(code).await?;
        if !room.is_admin(requester_id) {
            return Err(GameError::Forbidden(
                "Only the admin can change settings".to_string(),
            ));
        }
        room.settings.apply(patch);
        self.store.save_room(&room).await?;

        self.broadcaster.publish(
            code,
            RoomEvent::SettingsUpdate {
                settings: room.settings.clone(),
            },
        );
        Ok(RoomView::from(&room))
    }
}

fn valid_name(name: &str) -> GameResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 30 {
        return Err(GameError::Validation(
            "Player name must be 1-30 characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
