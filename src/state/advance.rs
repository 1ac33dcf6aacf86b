use std::time::Duration;

use super::clue::clue_new_event;
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::RoomEvent;
use crate::types::{Room, RoomStatus, RoomView};

/// Sent to the room when the clue queue runs dry
pub const GAME_OVER_MESSAGE: &str =
    "No more messages for now. If there are new stories, we will update you!";

/// Delay between a clue being solved and the automatic advance, so players
/// see the completed sentence before it is replaced
const AUTO_ADVANCE_DELAY: Duration = Duration::from_secs(2);

fn timer_expired(room: &Room) -> bool {
    if room.settings.no_time_limit {
        return false;
    }
    let Some(clue) = &room.current_clue else {
        return false;
    };
    let started = clue.timer_started_at.as_deref().unwrap_or(&clue.created_at);
    match chrono::DateTime::parse_from_rfc3339(started) {
        Ok(ts) => {
            let elapsed = chrono::Utc::now().signed_duration_since(ts);
            elapsed.num_seconds() >= i64::from(room.settings.timer_seconds)
        }
        Err(_) => false,
    }
}

impl AppState {
    /// Move the room to the next queued clue, or end the game when the
    /// queue is empty. Permitted for the admin, or for anyone once the
    /// clue's timer has expired or the clue is solved.
    pub async fn try_advance(&self, code: &str, requester_id: Option<&str>) -> GameResult<RoomView> {
        let mut room = self.require_room(code).await?;
        let Some(current) = &room.current_clue else {
            return Err(GameError::Validation("No active clue".to_string()));
        };

        let is_admin = requester_id.map(|id| room.is_admin(id)).unwrap_or(false);
        let eligible = is_admin || current.is_completed || timer_expired(&room);
        if !eligible {
            return Err(GameError::Forbidden(
                "The clue is still running".to_string(),
            ));
        }

        if room.clue_queue.is_empty() {
            room.current_clue = None;
            room.status = RoomStatus::Ended;
            self.store.save_room(&room).await?;

            tracing::info!(room = %room.code, "game over, queue exhausted");
            self.broadcaster.publish(
                code,
                RoomEvent::GameCompleted {
                    message: GAME_OVER_MESSAGE.to_string(),
                },
            );
        } else {
            let mut next = room.clue_queue.remove(0);
            next.timer_started_at = Some(chrono::Utc::now().to_rfc3339());
            room.current_clue_index += 1;
            room.current_clue = Some(next);
            room.reset_correct_guesses();
            self.store.save_room(&room).await?;

            if let Some(event) = clue_new_event(&room) {
                self.broadcaster.publish(code, event);
            }
        }

        Ok(RoomView::from(&room))
    }
}

/// Schedule an advance shortly after a clue is solved. The created-at guard
/// makes the task a no-op if the room already moved to a different clue by
/// the time it fires.
pub(crate) fn spawn_auto_advance(state: AppState, code: String, clue_created_at: String) {
    tokio::spawn(async move {
        tokio::time::sleep(AUTO_ADVANCE_DELAY).await;

        match state.store.find_room(&code).await {
            Ok(Some(room)) => {
                let still_current = room
                    .current_clue
                    .as_ref()
                    .map(|c| c.created_at == clue_created_at)
                    .unwrap_or(false);
                if !still_current {
                    return;
                }
            }
            _ => return,
        }

        if let Err(e) = state.try_advance(&code, None).await {
            tracing::warn!(room = %code, "auto-advance failed: {e}");
        }
    });
}
