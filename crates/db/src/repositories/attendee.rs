//! Attendee repository.
//!
//! Resolution is find-or-create keyed by (event, session token). The unique
//! index on that pair is authoritative: when two requests race to create the
//! same attendee, exactly one insert survives and the loser re-selects the
//! surviving row.

use std::sync::Arc;

use crate::entities::{Attendee, attendee};
use chrono::Utc;
use liveq_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, SqlErr,
};

/// Attendee repository for database operations.
#[derive(Clone)]
pub struct AttendeeRepository {
    db: Arc<DatabaseConnection>,
}

impl AttendeeRepository {
    /// Create a new attendee repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an attendee by event and session token.
    pub async fn find_by_session(
        &self,
        event_id: i64,
        session_id: &str,
    ) -> AppResult<Option<attendee::Model>> {
        Attendee::find()
            .filter(attendee::Column::EventId.eq(event_id))
            .filter(attendee::Column::SessionId.eq(session_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the attendees who have interacted with an event.
    pub async fn count_by_event(&self, event_id: i64) -> AppResult<i64> {
        let count = Attendee::find()
            .filter(attendee::Column::EventId.eq(event_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count as i64)
    }

    /// Find or create the attendee for (event, session token), race-safe.
    pub async fn find_or_create(
        &self,
        event_id: i64,
        session_id: &str,
    ) -> AppResult<attendee::Model> {
        if let Some(existing) = self.find_by_session(event_id, session_id).await? {
            return Ok(existing);
        }

        let model = attendee::ActiveModel {
            event_id: Set(event_id),
            session_id: Set(session_id.to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        match model.insert(self.db.as_ref()).await {
            Ok(created) => Ok(created),
            // Lost a create race: the other insert won, resolve to it.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => self
                .find_by_session(event_id, session_id)
                .await?
                .ok_or_else(|| {
                    AppError::Database("Attendee vanished after insert conflict".to_string())
                }),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }
}
