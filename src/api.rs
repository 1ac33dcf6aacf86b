//! HTTP API endpoints for the room and clue lifecycle.
//!
//! Player identity arrives as an `x-player-id` header set by the client once
//! it receives its id from create/join. The server trusts the header; there
//! is no session layer here.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{GameError, GameResult};
use crate::protocol::{GuessOutcome, SentenceProgress};
use crate::state::AppState;
use crate::types::{PlayerId, RoomView, SettingsPatch};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/join", post(join_room))
        .route("/api/rooms/{code}/state", get(room_state))
        .route("/api/rooms/{code}/clues", post(generate_clues))
        .route("/api/rooms/{code}/guess", post(submit_guess))
        .route("/api/rooms/{code}/advance", post(advance_clue))
        .route("/api/rooms/{code}/settings", post(update_settings))
        .route("/api/rooms/{code}/kick", post(kick_player))
        .route("/api/rooms/{code}/sentence", get(sentence))
        .with_state(state)
}

/// Pull the authenticated player id off the request headers
fn player_id(headers: &HeaderMap) -> GameResult<String> {
    headers
        .get("x-player-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GameError::Unauthenticated("Missing x-player-id header".to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomRequest {
    player_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRoomRequest {
    room_code: String,
    player_name: String,
}

/// Room plus the caller's freshly minted player id
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomWithIdentity {
    room: RoomView,
    player_id: PlayerId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateCluesRequest {
    secrets: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GuessRequest {
    guess: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KickRequest {
    player_id: PlayerId,
}

async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRoomRequest>,
) -> GameResult<Json<RoomWithIdentity>> {
    let (room, player_id) = state.create_room(&body.player_name).await?;
    Ok(Json(RoomWithIdentity { room, player_id }))
}

async fn join_room(
    State(state): State<Arc<AppState>>,
    Json(body): Json<JoinRoomRequest>,
) -> GameResult<Json<RoomWithIdentity>> {
    let (room, player_id) = state.join_room(&body.room_code, &body.player_name).await?;
    Ok(Json(RoomWithIdentity { room, player_id }))
}

async fn room_state(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> GameResult<Json<RoomView>> {
    Ok(Json(state.room_state(&code).await?))
}

async fn generate_clues(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(body): Json<GenerateCluesRequest>,
) -> GameResult<Json<RoomView>> {
    let requester = player_id(&headers)?;
    Ok(Json(
        state
            .generate_and_enqueue(&code, &requester, &body.secrets)
            .await?,
    ))
}

async fn submit_guess(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(body): Json<GuessRequest>,
) -> GameResult<Json<GuessOutcome>> {
    let requester = player_id(&headers)?;
    Ok(Json(state.evaluate_guess(&code, &requester, &body.guess).await?))
}

async fn advance_clue(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> GameResult<Json<RoomView>> {
    let requester = player_id(&headers)?;
    Ok(Json(state.try_advance(&code, Some(&requester)).await?))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<SettingsPatch>,
) -> GameResult<Json<RoomView>> {
    let requester = player_id(&headers)?;
    Ok(Json(state.update_settings(&code, &requester, patch).await?))
}

async fn kick_player(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(body): Json<KickRequest>,
) -> GameResult<Json<RoomView>> {
    let requester = player_id(&headers)?;
    Ok(Json(
        state.kick_player(&code, &requester, &body.player_id).await?,
    ))
}

async fn sentence(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> GameResult<Json<SentenceProgress>> {
    let requester = player_id(&headers)?;
    Ok(Json(state.sentence_for_player(&code, &requester).await?))
}
