//! API endpoints.

mod events;
mod polls;
mod questions;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
///
/// Every route under `/events` shares the `{event}` capture name: the
/// public lookup routes read it as the slug, nested resources read it as
/// the numeric event id.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/events", events::router())
        .nest("/events/{event}/polls", polls::router())
        .nest("/events/{event}/questions", questions::router())
}
