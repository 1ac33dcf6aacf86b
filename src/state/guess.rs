use super::advance::spawn_auto_advance;
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::{GuessOutcome, RoomEvent, SentenceProgress};
use crate::types::PlayerSummary;
use crate::vault;
use crate::words;

const MSG_WRONG: &str = "Wrong! Try a different word.";
const MSG_ALREADY_GUESSED: &str = "You already guessed that word!";
const MSG_CORRECT: &str = "Correct!";
const MSG_SOLVED: &str = "Congratulations! You've solved this story!";

/// Seconds elapsed since an RFC3339 timestamp; unparseable input counts as 0
fn seconds_since(timestamp: &str) -> u64 {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|ts| {
            chrono::Utc::now()
                .signed_duration_since(ts)
                .num_seconds()
                .max(0) as u64
        })
        .unwrap_or(0)
}

/// Time-decayed award for a correct guess, never below one point
fn decayed_points(base_points: u32, created_at: &str, decay_rate: u32) -> u32 {
    let elapsed = seconds_since(created_at);
    let decay = elapsed / u64::from(decay_rate.max(1));
    let points = i64::from(base_points) - decay as i64;
    points.max(1) as u32
}

impl AppState {
    /// Evaluate one guess against the active clue. Correct guesses score
    /// decayed points and are tracked per player; covering every important
    /// word completes the clue.
    pub async fn evaluate_guess(
        &self,
        code: &str,
        player_id: &str,
        guess: &str,
    ) -> GameResult<GuessOutcome> {
        let guess = guess.trim().to_lowercase();
        if guess.is_empty() {
            return Err(GameError::Validation("Guess must not be empty".to_string()));
        }

        let mut room = self.require_room(code).await?;
        let Some(clue) = room.current_clue.clone() else {
            return Err(GameError::Validation("No active clue".to_string()));
        };
        if room.player(player_id).is_none() {
            return Err(GameError::NotFound(format!(
                "Player {player_id} not in room"
            )));
        }

        // Clues from before secrets were stored alongside the mapping
        // cannot be guessed against
        let sealed_secret = clue.original_secret_encrypted.as_ref().ok_or_else(|| {
            GameError::Validation("This clue has no guessable secret".to_string())
        })?;
        let secret: String = vault::open(sealed_secret, &room.room_key)?;
        let important_words = words::extract_important_words(&secret);

        let matched = words::find_match(&important_words, &guess).cloned();

        // A miss mutates nothing and stays between the server and the guesser
        let Some(matched_word) = matched else {
            let player = room.player(player_id).ok_or_else(|| {
                GameError::NotFound(format!("Player {player_id} not in room"))
            })?;
            return Ok(GuessOutcome {
                correct: false,
                message: MSG_WRONG.to_string(),
                matched_word: None,
                points: 0,
                sentence_with_blanks: words::sentence_with_blanks(
                    &secret,
                    &player.correct_guesses,
                ),
                clue_completed: false,
            });
        };

        let already_guessed = room
            .player(player_id)
            .map(|p| p.correct_guesses.contains(&matched_word))
            .unwrap_or(false);
        if already_guessed {
            let player = room.player(player_id).ok_or_else(|| {
                GameError::NotFound(format!("Player {player_id} not in room"))
            })?;
            return Ok(GuessOutcome {
                correct: false,
                message: MSG_ALREADY_GUESSED.to_string(),
                matched_word: Some(matched_word),
                points: 0,
                sentence_with_blanks: words::sentence_with_blanks(
                    &secret,
                    &player.correct_guesses,
                ),
                clue_completed: false,
            });
        }

        let points = decayed_points(clue.base_points, &clue.created_at, room.settings.decay_rate);

        let (sentence, completed_now) = {
            let player = room.player_mut(player_id).ok_or_else(|| {
                GameError::NotFound(format!("Player {player_id} not in room"))
            })?;
            player.correct_guesses.push(matched_word.clone());
            player.score += points;
            let sentence = words::sentence_with_blanks(&secret, &player.correct_guesses);
            let covered = words::all_words_covered(&important_words, &player.correct_guesses);
            (sentence, covered)
        };

        // Completion is monotonic; a solved clue stays solved
        if let Some(current) = room.current_clue.as_mut() {
            current.is_completed = clue.is_completed || completed_now;
        }
        self.store.save_room(&room).await?;

        let scoreboard: Vec<PlayerSummary> = room.players.iter().map(PlayerSummary::from).collect();
        self.broadcaster.publish(
            code,
            RoomEvent::ScoreUpdate {
                player_id: player_id.to_string(),
                points,
                players: scoreboard,
            },
        );
        self.broadcaster.publish(
            code,
            RoomEvent::GuessResult {
                player_id: player_id.to_string(),
                correct: true,
                matched_word: Some(matched_word.clone()),
                points,
                sentence_with_blanks: sentence.clone(),
            },
        );

        // With no clue timer the solved clue would otherwise sit forever
        if completed_now && room.settings.no_time_limit {
            spawn_auto_advance(self.clone(), code.to_string(), clue.created_at.clone());
        }

        Ok(GuessOutcome {
            correct: true,
            message: if completed_now { MSG_SOLVED } else { MSG_CORRECT }.to_string(),
            matched_word: Some(matched_word),
            points,
            sentence_with_blanks: sentence,
            clue_completed: completed_now,
        })
    }

    /// Current partially-revealed sentence for one player
    pub async fn sentence_for_player(
        &self,
        code: &str,
        player_id: &str,
    ) -> GameResult<SentenceProgress> {
        let room = self.require_room(code).await?;
        let Some(clue) = &room.current_clue else {
            return Err(GameError::Validation("No active clue".to_string()));
        };
        let player = room
            .player(player_id)
            .ok_or_else(|| GameError::NotFound(format!("Player {player_id} not in room")))?;
        let sealed_secret = clue.original_secret_encrypted.as_ref().ok_or_else(|| {
            GameError::Validation("This clue has no guessable secret".to_string())
        })?;
        let secret: String = vault::open(sealed_secret, &room.room_key)?;
        Ok(SentenceProgress {
            sentence_with_blanks: words::sentence_with_blanks(&secret, &player.correct_guesses),
            correct_guesses: player.correct_guesses.clone(),
            total_words: secret
                .split_whitespace()
                .filter(|w| w.chars().count() > 2)
                .count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::RecordingBroadcaster;
    use crate::store::{MemoryStore, RoomStore};
    use crate::types::{Clue, RoomStatus};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn test_state() -> (AppState, Arc<RecordingBroadcaster>) {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let state = AppState::new(Arc::new(MemoryStore::new()), broadcaster.clone(), None);
        (state, broadcaster)
    }

    /// Room playing a clue for "Meet at the old oak tree at midnight",
    /// base 12 points, created `age_seconds` ago
    async fn room_with_clue(state: &AppState, age_seconds: i64) -> (String, String) {
        let (view, admin_id) = state.create_room("alice").await.unwrap();
        let mut room = state.require_room(&view.code).await.unwrap();

        let secret = "Meet at the old oak tree at midnight".to_string();
        let mapping: HashMap<String, String> = HashMap::new();
        let created = (chrono::Utc::now() - chrono::Duration::seconds(age_seconds)).to_rfc3339();
        room.current_clue = Some(Clue {
            story: "A long enough story about an elder sentinel and shadows.".to_string(),
            mapping_encrypted: vault::seal(&mapping, &room.room_key).unwrap(),
            original_secret_encrypted: Some(vault::seal(&secret, &room.room_key).unwrap()),
            base_points: 12,
            created_at: created.clone(),
            timer_started_at: Some(created),
            is_completed: false,
        });
        room.status = RoomStatus::Playing;
        state.store.save_room(&room).await.unwrap();
        (view.code, admin_id)
    }

    #[tokio::test]
    async fn correct_guess_scores_decayed_points() {
        let (state, broadcaster) = test_state();
        let (code, player_id) = room_with_clue(&state, 5).await;

        let outcome = state.evaluate_guess(&code, &player_id, " OAK ").await.unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.message, MSG_CORRECT);
        assert_eq!(outcome.matched_word.as_deref(), Some("oak"));
        // 12 base minus 5 seconds of decay at rate 1
        assert_eq!(outcome.points, 7);
        assert!(!outcome.clue_completed);
        assert!(outcome.sentence_with_blanks.contains("oak"));

        let room = state.require_room(&code).await.unwrap();
        assert_eq!(room.players[0].score, 7);
        assert_eq!(room.players[0].correct_guesses, vec!["oak"]);

        let events = broadcaster.take();
        assert!(events
            .iter()
            .any(|(_, e)| matches!(e, RoomEvent::ScoreUpdate { points: 7, .. })));
        assert!(events
            .iter()
            .any(|(_, e)| matches!(e, RoomEvent::GuessResult { correct: true, .. })));
    }

    #[tokio::test]
    async fn decay_floors_at_one_point() {
        let (state, _) = test_state();
        let (code, player_id) = room_with_clue(&state, 3600).await;

        let outcome = state.evaluate_guess(&code, &player_id, "oak").await.unwrap();
        assert_eq!(outcome.points, 1);
    }

    #[tokio::test]
    async fn wrong_guess_scores_nothing() {
        let (state, broadcaster) = test_state();
        let (code, player_id) = room_with_clue(&state, 0).await;

        let outcome = state.evaluate_guess(&code, &player_id, "dragon").await.unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.message, MSG_WRONG);
        assert_eq!(outcome.points, 0);

        let room = state.require_room(&code).await.unwrap();
        assert_eq!(room.players[0].score, 0);

        // Misses are private; nothing reaches the room
        assert!(broadcaster.take().is_empty());
    }

    #[tokio::test]
    async fn repeated_word_is_rejected_without_scoring() {
        let (state, _) = test_state();
        let (code, player_id) = room_with_clue(&state, 0).await;

        state.evaluate_guess(&code, &player_id, "oak").await.unwrap();
        // "oaks" matches the same word through containment
        let outcome = state.evaluate_guess(&code, &player_id, "oaks").await.unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.message, MSG_ALREADY_GUESSED);
        assert_eq!(outcome.points, 0);

        let room = state.require_room(&code).await.unwrap();
        assert_eq!(room.players[0].correct_guesses, vec!["oak"]);
    }

    #[tokio::test]
    async fn covering_every_word_completes_the_clue() {
        let (state, _) = test_state();
        let (code, player_id) = room_with_clue(&state, 0).await;

        for word in ["meet", "old", "oak", "tree"] {
            let outcome = state.evaluate_guess(&code, &player_id, word).await.unwrap();
            assert!(outcome.correct);
            assert!(!outcome.clue_completed);
        }
        let outcome = state
            .evaluate_guess(&code, &player_id, "midnight")
            .await
            .unwrap();
        assert!(outcome.correct);
        assert!(outcome.clue_completed);
        assert_eq!(outcome.message, MSG_SOLVED);
        // "the" is never guessable (stop word), so it stays blanked
        assert_eq!(outcome.sentence_with_blanks, "Meet at ___ old oak tree at midnight");

        let room = state.require_room(&code).await.unwrap();
        assert!(room.current_clue.unwrap().is_completed);
    }

    #[tokio::test]
    async fn completion_counts_per_player_not_per_room() {
        let (state, _) = test_state();
        let (code, alice) = room_with_clue(&state, 0).await;
        let (_, bob) = state.join_room(&code, "bob").await.unwrap();

        for word in ["meet", "old", "oak", "tree"] {
            state.evaluate_guess(&code, &alice, word).await.unwrap();
        }
        // Bob guessing the last word does not complete it for him
        let outcome = state.evaluate_guess(&code, &bob, "midnight").await.unwrap();
        assert!(outcome.correct);
        assert!(!outcome.clue_completed);

        // Alice finishing her own set does
        let outcome = state.evaluate_guess(&code, &alice, "midnight").await.unwrap();
        assert!(outcome.clue_completed);
    }

    #[tokio::test]
    async fn guessing_needs_an_active_clue_and_a_seat() {
        let (state, _) = test_state();
        let (view, admin_id) = state.create_room("alice").await.unwrap();

        let err = state
            .evaluate_guess(&view.code, &admin_id, "oak")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Validation(_)));

        let (code, _) = room_with_clue(&state, 0).await;
        let err = state
            .evaluate_guess(&code, "stranger", "oak")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::NotFound(_)));

        let err = state.evaluate_guess(&code, "stranger", "  ").await.unwrap_err();
        assert!(matches!(err, GameError::Validation(_)));
    }

    #[tokio::test]
    async fn legacy_clue_without_secret_is_unguessable() {
        let (state, _) = test_state();
        let (code, player_id) = room_with_clue(&state, 0).await;

        let mut room = state.require_room(&code).await.unwrap();
        room.current_clue.as_mut().unwrap().original_secret_encrypted = None;
        state.store.save_room(&room).await.unwrap();

        let err = state
            .evaluate_guess(&code, &player_id, "oak")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Validation(_)));
    }

    #[tokio::test]
    async fn sentence_reflects_the_players_own_progress() {
        let (state, _) = test_state();
        let (code, alice) = room_with_clue(&state, 0).await;
        let (_, bob) = state.join_room(&code, "bob").await.unwrap();

        state.evaluate_guess(&code, &alice, "midnight").await.unwrap();

        let for_alice = state.sentence_for_player(&code, &alice).await.unwrap();
        assert!(for_alice.sentence_with_blanks.ends_with("midnight"));
        assert_eq!(for_alice.correct_guesses, vec!["midnight"]);
        // meet, the, old, oak, tree, midnight are long enough to be blanked
        assert_eq!(for_alice.total_words, 6);
        let for_bob = state.sentence_for_player(&code, &bob).await.unwrap();
        assert!(for_bob.sentence_with_blanks.ends_with("________"));
        assert!(for_bob.correct_guesses.is_empty());
    }
}
