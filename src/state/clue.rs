use super::AppState;
use crate::clues;
use crate::error::{GameError, GameResult};
use crate::protocol::RoomEvent;
use crate::types::{Room, RoomStatus, RoomView};

/// Announcement for the room's active clue, if any
pub(crate) fn clue_new_event(room: &Room) -> Option<RoomEvent> {
    let clue = room.current_clue.as_ref()?;
    Some(RoomEvent::ClueNew {
        story: clue.story.clone(),
        created_at: clue.created_at.clone(),
        base_points: clue.base_points,
        difficulty: room.settings.difficulty,
        clue_index: room.current_clue_index,
        total_clues: room.total_clues(),
        timer_started_at: clue
            .timer_started_at
            .clone()
            .unwrap_or_else(|| clue.created_at.clone()),
    })
}

impl AppState {
    /// Generate a batch of clues from plaintext secrets and start playing.
    /// A fresh batch replaces whatever was queued before; the first clue
    /// activates immediately and the rest wait in the queue.
    pub async fn generate_and_enqueue(
        &self,
        code: &str,
        requester_id: &str,
        secrets: &[String],
    ) -> GameResult<RoomView> {
        let room = self.require_room(code).await?;
        if !room.is_admin(requester_id) {
            return Err(GameError::Forbidden(
                "Only the admin can generate clues".to_string(),
            ));
        }
        let storyteller = self.storyteller.as_ref().ok_or_else(|| GameError::Generation {
            attempts: 0,
            last_error: "no story provider configured".to_string(),
        })?;

        let mut new_clues = clues::generate_clues(
            storyteller.as_ref(),
            secrets,
            room.settings.difficulty,
            &room.room_key,
            self.generation_timeout,
        )
        .await?;

        // Reload before committing: generation is slow and the room may have
        // moved on (players joining, settings changes) in the meantime
        let mut room = self.require_room(code).await?;

        let mut first = new_clues.remove(0);
        first.timer_started_at = Some(chrono::Utc::now().to_rfc3339());
        room.current_clue = Some(first);
        room.clue_queue = new_clues;
        room.current_clue_index = 0;
        room.status = RoomStatus::Playing;
        room.reset_correct_guesses();
        self.store.save_room(&room).await?;

        tracing::info!(room = %room.code, clues = room.total_clues(), "clue batch enqueued");
        if let Some(event) = clue_new_event(&room) {
            self.broadcaster.publish(code, event);
        }
        Ok(RoomView::from(&room))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::RecordingBroadcaster;
    use crate::llm::{NarrativeResult, StoryOutput, StoryProvider, StoryRequest};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Always succeeds with a fixed two-word story
    struct FixedProvider;

    #[async_trait]
    impl StoryProvider for FixedProvider {
        async fn generate(&self, _request: StoryRequest) -> NarrativeResult<StoryOutput> {
            let mut mapping = HashMap::new();
            mapping.insert("oak".to_string(), "elder sentinel".to_string());
            mapping.insert("midnight".to_string(), "hour of shadows".to_string());
            Ok(StoryOutput {
                story: "Beneath the elder sentinel the travellers waited for the hour \
                        of shadows, counting their heartbeats."
                    .to_string(),
                mapping,
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn test_state(with_provider: bool) -> (AppState, Arc<RecordingBroadcaster>) {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let storyteller: Option<Arc<dyn StoryProvider>> =
            with_provider.then(|| Arc::new(FixedProvider) as Arc<dyn StoryProvider>);
        let state = AppState::new(Arc::new(MemoryStore::new()), broadcaster.clone(), storyteller);
        (state, broadcaster)
    }

    #[tokio::test]
    async fn batch_activates_first_and_queues_rest() {
        let (state, broadcaster) = test_state(true);
        let (view, admin_id) = state.create_room("alice").await.unwrap();

        let secrets = vec![
            "Meet at the old oak tree".to_string(),
            "The gold is under the floor".to_string(),
        ];
        let view = state
            .generate_and_enqueue(&view.code, &admin_id, &secrets)
            .await
            .unwrap();

        assert_eq!(view.status, RoomStatus::Playing);
        assert!(view.current_clue.is_some());
        assert_eq!(view.clue_queue.len(), 1);
        assert_eq!(view.current_clue_index, 0);
        assert!(view
            .current_clue
            .as_ref()
            .unwrap()
            .timer_started_at
            .is_some());

        let events = broadcaster.take();
        match &events[..] {
            [(code, RoomEvent::ClueNew {
                clue_index,
                total_clues,
                ..
            })] => {
                assert_eq!(code, &view.code);
                assert_eq!(*clue_index, 0);
                assert_eq!(*total_clues, 2);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fresh_batch_replaces_the_queue() {
        let (state, _) = test_state(true);
        let (view, admin_id) = state.create_room("alice").await.unwrap();

        let first = vec!["one secret here".to_string(), "two secrets here".to_string()];
        state
            .generate_and_enqueue(&view.code, &admin_id, &first)
            .await
            .unwrap();

        let second = vec!["a different secret".to_string()];
        let view = state
            .generate_and_enqueue(&view.code, &admin_id, &second)
            .await
            .unwrap();

        assert!(view.current_clue.is_some());
        assert_eq!(view.clue_queue.len(), 0);
        assert_eq!(view.current_clue_index, 0);
    }

    #[tokio::test]
    async fn non_admin_cannot_generate() {
        let (state, _) = test_state(true);
        let (view, _) = state.create_room("alice").await.unwrap();
        let (_, bob_id) = state.join_room(&view.code, "bob").await.unwrap();

        let err = state
            .generate_and_enqueue(&view.code, &bob_id, &["some secret".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Forbidden(_)));
    }

    #[tokio::test]
    async fn missing_provider_is_a_generation_error() {
        let (state, _) = test_state(false);
        let (view, admin_id) = state.create_room("alice").await.unwrap();

        let err = state
            .generate_and_enqueue(&view.code, &admin_id, &["some secret".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Generation { .. }));
    }
}
