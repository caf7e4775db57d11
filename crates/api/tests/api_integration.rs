//! Router-level tests against a mocked database.

#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use liveq_api::{AppState, BroadcastHub};
use liveq_common::config::BroadcastConfig;
use liveq_core::{AttendeeService, EventService, PollService, QuestionService};
use liveq_db::{
    entities::{attendee, event, poll, question},
    repositories::{AttendeeRepository, EventRepository, PollRepository, QuestionRepository},
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app(db: MockDatabase) -> Router {
    let conn = Arc::new(db.into_connection());

    let state = AppState {
        event_service: EventService::new(EventRepository::new(conn.clone())),
        attendee_service: AttendeeService::new(AttendeeRepository::new(conn.clone())),
        poll_service: PollService::new(PollRepository::new(conn.clone())),
        question_service: QuestionService::new(QuestionRepository::new(conn)),
        hub: BroadcastHub::new(&BroadcastConfig::default()),
    };

    Router::new()
        .nest("/api/v1", liveq_api::router())
        .with_state(state)
}

fn test_event() -> event::Model {
    event::Model {
        id: 1,
        title: "Town Hall".to_string(),
        slug: "town-hall".to_string(),
        description: None,
        short_code: "ABCD1234".to_string(),
        host_code: "host_abc123def456".to_string(),
        is_active: true,
        created_at: Utc::now().into(),
    }
}

fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
    std::collections::BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_create_event_rejects_invalid_slug() {
    let app = app(MockDatabase::new(DatabaseBackend::Postgres));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/events",
            r#"{"title":"Town Hall","slug":"Bad Slug"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_get_unknown_event_is_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<event::Model>::new()]);

    let response = app(db)
        .oneshot(
            Request::builder()
                .uri("/api/v1/events/no-such-event")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_host_view_embeds_counts_and_lists() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // event lookup by slug
        .append_query_results([vec![test_event()]])
        // attendee count
        .append_query_results([vec![count_row(5)]])
        // polls, then questions
        .append_query_results([Vec::<poll::Model>::new()])
        .append_query_results([Vec::<question::Model>::new()]);

    let mut request = Request::builder()
        .uri("/api/v1/events/town-hall/host")
        .body(Body::empty())
        .unwrap();
    request
        .headers_mut()
        .insert("x-host-code", "host_abc123def456".parse().unwrap());

    let response = app(db).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["host_code"], "host_abc123def456");
    assert_eq!(body["attendee_count"], 5);
    assert_eq!(body["polls"], json!([]));
    assert_eq!(body["questions"], json!([]));
}

#[tokio::test]
async fn test_host_event_listing_returns_totals() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // events for the host code
        .append_query_results([vec![test_event()]])
        // total across all pages
        .append_query_results([vec![count_row(1)]])
        // question count for the listed event
        .append_query_results([vec![count_row(3)]]);

    let response = app(db)
        .oneshot(
            Request::builder()
                .uri("/api/v1/events/host/host_abc123def456")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["events"][0]["slug"], "town-hall");
    assert_eq!(body["events"][0]["question_count"], 3);
}

#[tokio::test]
async fn test_create_poll_requires_host_code() {
    let app = app(MockDatabase::new(DatabaseBackend::Postgres));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/events/1/polls",
            r#"{"question_text":"Lunch?","options":["Yes","No"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_create_poll_rejects_wrong_host_code() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![test_event()]]);

    let mut request = json_request(
        "POST",
        "/api/v1/events/1/polls",
        r#"{"question_text":"Lunch?","options":["Yes","No"]}"#,
    );
    request
        .headers_mut()
        .insert("x-host-code", "host_wrongwrong1".parse().unwrap());

    let response = app(db).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_vote_on_draft_poll_is_invalid_state() {
    let attendee = attendee::Model {
        id: 42,
        event_id: 1,
        session_id: "5e6a1c9b3f8d4a7e9b2c5d8f1a4b7c0d".to_string(),
        created_at: Utc::now().into(),
    };
    let draft_poll = poll::Model {
        id: 7,
        event_id: 1,
        question_text: "Lunch?".to_string(),
        poll_type: poll::PollType::Single,
        status: poll::PollStatus::Draft,
        created_at: Utc::now().into(),
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // event lookup
        .append_query_results([vec![test_event()]])
        // attendee find: none yet
        .append_query_results([Vec::<attendee::Model>::new()])
        // attendee insert returning
        .append_exec_results([MockExecResult {
            last_insert_id: 42,
            rows_affected: 1,
        }])
        .append_query_results([vec![attendee]])
        // poll lookup
        .append_query_results([vec![draft_poll]]);

    let response = app(db)
        .oneshot(json_request(
            "POST",
            "/api/v1/events/1/polls/7/vote",
            r#"{"option_id":3}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_STATE");
}
