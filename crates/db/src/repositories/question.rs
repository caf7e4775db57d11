//! Question repository: questions and the upvote toggle ledger.

use std::sync::Arc;

use crate::entities::{Question, QuestionVote, question, question_vote};
use chrono::Utc;
use liveq_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get a question by ID, returning an error if not found.
    pub async fn get_by_id(&self, question_id: i64) -> AppResult<question::Model> {
        Question::find_by_id(question_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Question not found: {question_id}")))
    }

    /// Create a new question.
    pub async fn create(&self, model: question::ActiveModel) -> AppResult<question::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List an event's questions in submission order.
    pub async fn find_by_event(&self, event_id: i64) -> AppResult<Vec<question::Model>> {
        Question::find()
            .filter(question::Column::EventId.eq(event_id))
            .order_by_asc(question::Column::CreatedAt)
            .order_by_asc(question::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count an event's questions.
    pub async fn count_by_event(&self, event_id: i64) -> AppResult<i64> {
        let count = Question::find()
            .filter(question::Column::EventId.eq(event_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count as i64)
    }

    /// Flip a question's answered flag.
    pub async fn set_answered(
        &self,
        question: question::Model,
        is_answered: bool,
    ) -> AppResult<question::Model> {
        let mut active: question::ActiveModel = question.into();
        active.is_answered = Set(is_answered);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the upvote row for (question, attendee), if present.
    pub async fn find_vote(
        &self,
        question_id: i64,
        attendee_id: i64,
    ) -> AppResult<Option<question_vote::Model>> {
        QuestionVote::find()
            .filter(question_vote::Column::QuestionId.eq(question_id))
            .filter(question_vote::Column::AttendeeId.eq(attendee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an upvote row. A race losing to a concurrent insert hits the
    /// unique index and surfaces as `Conflict` rather than a raw error.
    pub async fn insert_vote(
        &self,
        question_id: i64,
        attendee_id: i64,
    ) -> AppResult<question_vote::Model> {
        let model = question_vote::ActiveModel {
            question_id: Set(question_id),
            attendee_id: Set(attendee_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::Conflict("Question already upvoted".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Delete an upvote row.
    pub async fn delete_vote(&self, vote: question_vote::Model) -> AppResult<()> {
        vote.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count upvotes for a question.
    pub async fn count_votes(&self, question_id: i64) -> AppResult<i64> {
        let count = QuestionVote::find()
            .filter(question_vote::Column::QuestionId.eq(question_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count as i64)
    }
}
