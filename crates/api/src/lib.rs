//! HTTP API layer for liveq.
//!
//! This crate provides the REST API and the real-time stream:
//!
//! - **Endpoints**: event, poll and question resources under `/api/v1`
//! - **Extractors**: host code and attendee session token headers
//! - **Streaming**: the per-event WebSocket broadcast hub
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod streaming;

pub use endpoints::router;
pub use middleware::AppState;
pub use streaming::{BroadcastHub, ws_handler};
