//! Question endpoints, nested under `/events/{event}/questions`.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::AppendHeaders,
    routing::{get, post, put},
};
use liveq_common::AppResult;
use liveq_core::{QuestionView, SubmitQuestionInput, UpvoteOutcome};

use crate::{
    extractors::{HostCode, SessionToken},
    middleware::AppState,
};

/// Submit a question. Mints and echoes the session token like voting does.
async fn submit_question(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(event_id): Path<i64>,
    Json(input): Json<SubmitQuestionInput>,
) -> AppResult<(
    StatusCode,
    AppendHeaders<[(&'static str, String); 1]>,
    Json<QuestionView>,
)> {
    state.event_service.get_by_id(event_id).await?;

    let (attendee, token) = state
        .attendee_service
        .resolve(event_id, token.as_deref())
        .await?;

    let question = state
        .question_service
        .submit(event_id, attendee.id, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([("x-session-id", token)]),
        Json(question),
    ))
}

/// Toggle an upvote on a question.
async fn upvote_question(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path((event_id, question_id)): Path<(i64, i64)>,
) -> AppResult<(AppendHeaders<[(&'static str, String); 1]>, Json<UpvoteOutcome>)> {
    state.event_service.get_by_id(event_id).await?;

    let (attendee, token) = state
        .attendee_service
        .resolve(event_id, token.as_deref())
        .await?;

    let outcome = state
        .question_service
        .upvote(event_id, question_id, attendee.id)
        .await?;

    Ok((AppendHeaders([("x-session-id", token)]), Json(outcome)))
}

/// Host list of questions, most upvoted first.
async fn list_questions(
    State(state): State<AppState>,
    HostCode(code): HostCode,
    Path(event_id): Path<i64>,
) -> AppResult<Json<Vec<QuestionView>>> {
    state
        .event_service
        .get_by_id_for_host(event_id, &code)
        .await?;

    let questions = state.question_service.list(event_id).await?;
    Ok(Json(questions))
}

/// Public list of questions, same ordering as the host list.
async fn list_questions_public(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> AppResult<Json<Vec<QuestionView>>> {
    state.event_service.get_by_id(event_id).await?;

    let questions = state.question_service.list(event_id).await?;
    Ok(Json(questions))
}

/// Flip a question's answered flag (host only).
async fn toggle_answered(
    State(state): State<AppState>,
    HostCode(code): HostCode,
    Path((event_id, question_id)): Path<(i64, i64)>,
) -> AppResult<Json<QuestionView>> {
    state
        .event_service
        .get_by_id_for_host(event_id, &code)
        .await?;

    let question = state
        .question_service
        .toggle_answered(event_id, question_id)
        .await?;
    Ok(Json(question))
}

/// Create the questions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_question).get(list_questions))
        .route("/public", get(list_questions_public))
        .route("/{question_id}/upvote", post(upvote_question))
        .route("/{question_id}/answered", put(toggle_answered))
}
