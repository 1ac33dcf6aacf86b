pub mod api;
pub mod broadcast;
pub mod clues;
pub mod error;
pub mod llm;
pub mod protocol;
pub mod state;
pub mod store;
pub mod types;
pub mod vault;
pub mod words;
pub mod ws;
