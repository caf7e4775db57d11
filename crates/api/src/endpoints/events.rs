//! Event endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use liveq_common::AppResult;
use liveq_core::{CreateEventInput, PollWithResults, QuestionView};
use liveq_db::entities::event;
use serde::{Deserialize, Serialize};

use crate::{extractors::HostCode, middleware::AppState};

/// Create event request.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    /// Optional custom host code; a random one is generated when absent.
    pub host_code: Option<String>,
}

/// Public event response. Never carries the host code.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub short_code: String,
    pub is_active: bool,
    pub created_at: i64,
}

impl From<event::Model> for EventResponse {
    fn from(event: event::Model) -> Self {
        Self {
            id: event.id,
            title: event.title,
            slug: event.slug,
            description: event.description,
            short_code: event.short_code,
            is_active: event.is_active,
            created_at: event.created_at.timestamp_millis(),
        }
    }
}

/// Host event response: the public view plus the host code and attendance.
#[derive(Debug, Serialize)]
pub struct HostEventResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub host_code: String,
    pub attendee_count: i64,
}

/// Full host dashboard view: polls with live counts and all questions.
#[derive(Debug, Serialize)]
pub struct HostEventDetail {
    #[serde(flatten)]
    pub summary: HostEventResponse,
    pub polls: Vec<PollWithResults>,
    pub questions: Vec<QuestionView>,
}

/// Pagination for the host event listing.
#[derive(Debug, Deserialize)]
pub struct HostEventsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// One row in the host event listing.
#[derive(Debug, Serialize)]
pub struct HostEventSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub host_code: String,
    pub is_active: bool,
    pub created_at: i64,
    pub question_count: i64,
}

/// Host event listing with the total across all pages.
#[derive(Debug, Serialize)]
pub struct HostEventList {
    pub events: Vec<HostEventSummary>,
    pub total: u64,
}

/// Create an event.
async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<HostEventResponse>)> {
    let created = state
        .event_service
        .create_event(CreateEventInput {
            title: req.title,
            slug: req.slug,
            description: req.description,
            host_code: req.host_code,
        })
        .await?;

    let host_code = created.host_code.clone();
    Ok((
        StatusCode::CREATED,
        Json(HostEventResponse {
            event: created.into(),
            host_code,
            attendee_count: 0,
        }),
    ))
}

/// Public event lookup by slug.
async fn get_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<EventResponse>> {
    let event = state.event_service.get_by_slug(&slug).await?;
    Ok(Json(event.into()))
}

/// Host view of an event: the host code, attendance, every poll with its
/// live counts and every question.
async fn get_event_host(
    State(state): State<AppState>,
    HostCode(code): HostCode,
    Path(slug): Path<String>,
) -> AppResult<Json<HostEventDetail>> {
    let event = state.event_service.get_for_host(&slug, &code).await?;
    let attendee_count = state.attendee_service.count_for_event(event.id).await?;
    let polls = state.poll_service.list_with_results(event.id).await?;
    let questions = state.question_service.list(event.id).await?;

    let host_code = event.host_code.clone();
    Ok(Json(HostEventDetail {
        summary: HostEventResponse {
            event: event.into(),
            host_code,
            attendee_count,
        },
        polls,
        questions,
    }))
}

/// List every event created with a host code, newest first.
async fn list_host_events(
    State(state): State<AppState>,
    Path(host_code): Path<String>,
    Query(query): Query<HostEventsQuery>,
) -> AppResult<Json<HostEventList>> {
    let (events, total) = state
        .event_service
        .list_for_host(&host_code, query.limit, query.offset)
        .await?;

    let mut rows = Vec::with_capacity(events.len());
    for event in events {
        let question_count = state.question_service.count(event.id).await?;
        rows.push(HostEventSummary {
            id: event.id,
            title: event.title,
            slug: event.slug,
            host_code: event.host_code,
            is_active: event.is_active,
            created_at: event.created_at.timestamp_millis(),
            question_count,
        });
    }

    Ok(Json(HostEventList {
        events: rows,
        total,
    }))
}

/// Create the events router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_event))
        .route("/host/{host_code}", get(list_host_events))
        .route("/{event}", get(get_event))
        .route("/{event}/host", get(get_event_host))
}
