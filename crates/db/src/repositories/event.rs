//! Event repository.

use std::sync::Arc;

use crate::entities::{Event, event};
use liveq_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr,
};

/// Event repository for database operations.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an event by its slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<event::Model>> {
        Event::find()
            .filter(event::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an event by slug, returning an error if not found.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<event::Model> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event not found: {slug}")))
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<event::Model>> {
        Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an event by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<event::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event not found: {id}")))
    }

    /// List the events created with a host code, newest first.
    pub async fn find_by_host_code(
        &self,
        host_code: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<event::Model>> {
        Event::find()
            .filter(event::Column::HostCode.eq(host_code))
            .order_by_desc(event::Column::CreatedAt)
            .order_by_desc(event::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the events created with a host code.
    pub async fn count_by_host_code(&self, host_code: &str) -> AppResult<u64> {
        Event::find()
            .filter(event::Column::HostCode.eq(host_code))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new event.
    ///
    /// A unique violation on slug, short code or host code surfaces as
    /// `Conflict` rather than a raw database error.
    pub async fn create(&self, model: event::ActiveModel) -> AppResult<event::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Event slug or code already exists".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }
}
