//! Poll endpoints, nested under `/events/{event}/polls`.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::AppendHeaders,
    routing::{get, post, put},
};
use liveq_common::AppResult;
use liveq_core::{CreatePollInput, PollResults, PollView};
use liveq_db::entities::poll::{PollStatus, PollType};
use serde::Deserialize;

use crate::{
    extractors::{HostCode, SessionToken},
    middleware::AppState,
};

/// Create poll request.
#[derive(Debug, Deserialize)]
pub struct CreatePollRequest {
    pub question_text: String,
    #[serde(default = "default_poll_type")]
    pub poll_type: PollType,
    pub options: Vec<String>,
}

const fn default_poll_type() -> PollType {
    PollType::Single
}

/// Status transition request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: PollStatus,
}

/// Vote request.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub option_id: i64,
}

/// Create a poll (host only). New polls start in `draft`.
async fn create_poll(
    State(state): State<AppState>,
    HostCode(code): HostCode,
    Path(event_id): Path<i64>,
    Json(req): Json<CreatePollRequest>,
) -> AppResult<(StatusCode, Json<PollView>)> {
    state
        .event_service
        .get_by_id_for_host(event_id, &code)
        .await?;

    let poll = state
        .poll_service
        .create_poll(
            event_id,
            CreatePollInput {
                question_text: req.question_text,
                poll_type: req.poll_type,
                options: req.options,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(poll)))
}

/// Get a poll with its options.
async fn get_poll(
    State(state): State<AppState>,
    Path((event_id, poll_id)): Path<(i64, i64)>,
) -> AppResult<Json<PollView>> {
    let poll = state.poll_service.get_poll(event_id, poll_id).await?;
    Ok(Json(poll))
}

/// Transition a poll's status (host only).
async fn update_status(
    State(state): State<AppState>,
    HostCode(code): HostCode,
    Path((event_id, poll_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<PollView>> {
    state
        .event_service
        .get_by_id_for_host(event_id, &code)
        .await?;

    let poll = state
        .poll_service
        .update_status(event_id, poll_id, req.status)
        .await?;
    Ok(Json(poll))
}

/// Cast a vote. Mints a session token when the request carries none and
/// echoes the token in effect back via `x-session-id`.
async fn vote(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path((event_id, poll_id)): Path<(i64, i64)>,
    Json(req): Json<VoteRequest>,
) -> AppResult<(AppendHeaders<[(&'static str, String); 1]>, Json<PollResults>)> {
    state.event_service.get_by_id(event_id).await?;

    let (attendee, token) = state
        .attendee_service
        .resolve(event_id, token.as_deref())
        .await?;

    let results = state
        .poll_service
        .cast_vote(event_id, poll_id, req.option_id, attendee.id)
        .await?;

    Ok((AppendHeaders([("x-session-id", token)]), Json(results)))
}

/// Current results, ordered by option position.
async fn get_results(
    State(state): State<AppState>,
    Path((event_id, poll_id)): Path<(i64, i64)>,
) -> AppResult<Json<PollResults>> {
    let results = state.poll_service.get_results(event_id, poll_id).await?;
    Ok(Json(results))
}

/// Create the polls router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_poll))
        .route("/{poll_id}", get(get_poll))
        .route("/{poll_id}/status", put(update_status))
        .route("/{poll_id}/vote", post(vote))
        .route("/{poll_id}/results", get(get_results))
}
