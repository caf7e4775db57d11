//! Event broadcaster seam.
//!
//! Services publish real-time notifications through this trait after each
//! committed mutation. The concrete implementation is the WebSocket hub in
//! the api crate; core never depends on the transport.

use async_trait::async_trait;
use liveq_common::AppResult;
use serde_json::Value;
use std::sync::Arc;

/// Trait for broadcasting real-time events to an event's audience.
///
/// One method per outbound frame type. Implementations must be best-effort:
/// delivery problems are handled internally and never fail the caller's
/// request path.
#[async_trait]
pub trait EventBroadcaster: Send + Sync {
    /// A poll was created in an event.
    async fn poll_created(&self, event_id: i64, payload: Value) -> AppResult<()>;

    /// A poll changed status.
    async fn poll_status_updated(&self, event_id: i64, payload: Value) -> AppResult<()>;

    /// A vote was recorded and fresh results are available.
    async fn vote_updated(&self, event_id: i64, payload: Value) -> AppResult<()>;

    /// A question was submitted.
    async fn question_submitted(&self, event_id: i64, payload: Value) -> AppResult<()>;

    /// A question's upvote count changed.
    async fn question_upvoted(&self, event_id: i64, payload: Value) -> AppResult<()>;
}

/// Shared handle to the active broadcaster implementation.
pub type BroadcasterService = Arc<dyn EventBroadcaster>;

/// A no-op implementation for tests or deployments without streaming.
#[derive(Clone, Default)]
pub struct NoOpBroadcaster;

#[cfg(test)]
pub(crate) mod testing {
    use super::{AppResult, EventBroadcaster, Value, async_trait};
    use std::sync::Mutex;

    /// Records every published frame so tests can assert payload shapes.
    #[derive(Default)]
    pub struct RecordingBroadcaster {
        frames: Mutex<Vec<(&'static str, Value)>>,
    }

    impl RecordingBroadcaster {
        #[allow(clippy::unwrap_used)]
        pub fn frames(&self) -> Vec<(&'static str, Value)> {
            self.frames.lock().unwrap().clone()
        }

        #[allow(clippy::unwrap_used)]
        fn record(&self, frame_type: &'static str, payload: Value) {
            self.frames.lock().unwrap().push((frame_type, payload));
        }
    }

    #[async_trait]
    impl EventBroadcaster for RecordingBroadcaster {
        async fn poll_created(&self, _event_id: i64, payload: Value) -> AppResult<()> {
            self.record("poll_created", payload);
            Ok(())
        }

        async fn poll_status_updated(&self, _event_id: i64, payload: Value) -> AppResult<()> {
            self.record("poll_status_updated", payload);
            Ok(())
        }

        async fn vote_updated(&self, _event_id: i64, payload: Value) -> AppResult<()> {
            self.record("vote_updated", payload);
            Ok(())
        }

        async fn question_submitted(&self, _event_id: i64, payload: Value) -> AppResult<()> {
            self.record("question_submitted", payload);
            Ok(())
        }

        async fn question_upvoted(&self, _event_id: i64, payload: Value) -> AppResult<()> {
            self.record("question_upvoted", payload);
            Ok(())
        }
    }
}

#[async_trait]
impl EventBroadcaster for NoOpBroadcaster {
    async fn poll_created(&self, _event_id: i64, _payload: Value) -> AppResult<()> {
        Ok(())
    }

    async fn poll_status_updated(&self, _event_id: i64, _payload: Value) -> AppResult<()> {
        Ok(())
    }

    async fn vote_updated(&self, _event_id: i64, _payload: Value) -> AppResult<()> {
        Ok(())
    }

    async fn question_submitted(&self, _event_id: i64, _payload: Value) -> AppResult<()> {
        Ok(())
    }

    async fn question_upvoted(&self, _event_id: i64, _payload: Value) -> AppResult<()> {
        Ok(())
    }
}
