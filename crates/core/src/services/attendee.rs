//! Attendee identity resolution.
//!
//! Attendees are anonymous and keyed by an opaque 32-character session
//! token scoped to one event. A request without a token gets a freshly
//! minted one; the caller is responsible for echoing it back to the client.

use liveq_common::{AppResult, CodeGenerator};
use liveq_db::{entities::attendee, repositories::AttendeeRepository};

/// Attendee service for identity resolution.
#[derive(Clone)]
pub struct AttendeeService {
    attendee_repo: AttendeeRepository,
    codes: CodeGenerator,
}

impl AttendeeService {
    /// Create a new attendee service.
    #[must_use]
    pub const fn new(attendee_repo: AttendeeRepository) -> Self {
        Self {
            attendee_repo,
            codes: CodeGenerator::new(),
        }
    }

    /// Resolve the attendee for (event, session token), creating both the
    /// token and the attendee row on first contact.
    ///
    /// Returns the attendee together with the token in effect. Two requests
    /// racing with the same fresh token converge on a single row.
    pub async fn resolve(
        &self,
        event_id: i64,
        session_token: Option<&str>,
    ) -> AppResult<(attendee::Model, String)> {
        let token = match session_token {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => self.codes.generate_session_token(),
        };

        let attendee = self.attendee_repo.find_or_create(event_id, &token).await?;
        Ok((attendee, token))
    }

    /// Number of attendees who have interacted with an event.
    pub async fn count_for_event(&self, event_id: i64) -> AppResult<i64> {
        self.attendee_repo.count_by_event(event_id).await
    }
}
