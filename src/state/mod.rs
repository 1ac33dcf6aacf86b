mod advance;
mod clue;
mod guess;
mod room;

use std::sync::Arc;
use std::time::Duration;

use crate::broadcast::Broadcaster;
use crate::llm::StoryProvider;
use crate::store::RoomStore;

pub use advance::GAME_OVER_MESSAGE;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RoomStore>,
    pub broadcaster: Arc<dyn Broadcaster>,
    /// Absent when no generator is configured; clue generation then fails
    /// with a clear error while the rest of the room keeps working
    pub storyteller: Option<Arc<dyn StoryProvider>>,
    /// Timeout handed to the storyteller per generation attempt
    pub generation_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RoomStore>,
        broadcaster: Arc<dyn Broadcaster>,
        storyteller: Option<Arc<dyn StoryProvider>>,
    ) -> Self {
        Self {
            store,
            broadcaster,
            storyteller,
            generation_timeout: Duration::from_secs(30),
        }
    }
}
