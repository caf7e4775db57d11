//! Poll repository: polls, options and the vote ledger.
//!
//! The vote paths run inside transactions, and the single-choice replace
//! takes the poll row lock so concurrent replaces by the same attendee
//! cannot interleave into duplicate responses. The unique index on
//! (poll_id, option_id, attendee_id) is the storage backstop and its
//! violations are translated into `DuplicateVote`.

use std::sync::Arc;

use crate::entities::{Poll, PollOption, PollResponse, poll, poll_option, poll_response};
use chrono::Utc;
use liveq_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

/// Vote count for a single option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionVoteCount {
    pub option: poll_option::Model,
    pub vote_count: i64,
}

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, poll_id: i64) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(poll_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a poll by ID, returning an error if not found.
    pub async fn get_by_id(&self, poll_id: i64) -> AppResult<poll::Model> {
        self.find_by_id(poll_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Poll not found: {poll_id}")))
    }

    /// List an event's polls in creation order.
    pub async fn find_by_event(&self, event_id: i64) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::EventId.eq(event_id))
            .order_by_asc(poll::Column::CreatedAt)
            .order_by_asc(poll::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a poll together with its options, atomically.
    pub async fn create_with_options(
        &self,
        poll: poll::ActiveModel,
        options: Vec<poll_option::ActiveModel>,
    ) -> AppResult<(poll::Model, Vec<poll_option::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = poll
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut created_options = Vec::with_capacity(options.len());
        for mut option in options {
            option.poll_id = Set(created.id);
            let created_option = option
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            created_options.push(created_option);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        created_options.sort_by_key(|o| (o.position, o.id));
        Ok((created, created_options))
    }

    /// Update a poll's status.
    pub async fn update_status(
        &self,
        poll: poll::Model,
        status: poll::PollStatus,
    ) -> AppResult<poll::Model> {
        let mut active: poll::ActiveModel = poll.into();
        active.status = Set(status);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a poll's options ordered by position (id as tie-break).
    pub async fn find_options(&self, poll_id: i64) -> AppResult<Vec<poll_option::Model>> {
        PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .order_by_asc(poll_option::Column::Position)
            .order_by_asc(poll_option::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an option, requiring that it belongs to the given poll.
    pub async fn find_option_in_poll(
        &self,
        option_id: i64,
        poll_id: i64,
    ) -> AppResult<Option<poll_option::Model>> {
        PollOption::find_by_id(option_id)
            .filter(poll_option::Column::PollId.eq(poll_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a vote on a single-choice poll: any existing response by this
    /// attendee for this poll is removed, then the new response is inserted.
    /// A replace, not an additive operation, in one transaction.
    pub async fn replace_vote(
        &self,
        poll_id: i64,
        option_id: i64,
        attendee_id: i64,
    ) -> AppResult<poll_response::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // At read committed, two replaces whose deletes match no rows do not
        // conflict and both inserts would land. Taking the poll row lock
        // first serializes them.
        Poll::find_by_id(poll_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Poll not found: {poll_id}")))?;

        PollResponse::delete_many()
            .filter(poll_response::Column::PollId.eq(poll_id))
            .filter(poll_response::Column::AttendeeId.eq(attendee_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let inserted = Self::response_model(poll_id, option_id, attendee_id)
            .insert(&txn)
            .await
            .map_err(Self::translate_vote_err)?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted)
    }

    /// Record a vote on a multiple-choice poll. A repeat vote for the same
    /// option is rejected as `DuplicateVote`; votes for different options
    /// by the same attendee coexist.
    pub async fn insert_vote(
        &self,
        poll_id: i64,
        option_id: i64,
        attendee_id: i64,
    ) -> AppResult<poll_response::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let already_voted = PollResponse::find()
            .filter(poll_response::Column::PollId.eq(poll_id))
            .filter(poll_response::Column::OptionId.eq(option_id))
            .filter(poll_response::Column::AttendeeId.eq(attendee_id))
            .count(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if already_voted > 0 {
            return Err(AppError::DuplicateVote(
                "Vote already recorded for this option".to_string(),
            ));
        }

        let inserted = Self::response_model(poll_id, option_id, attendee_id)
            .insert(&txn)
            .await
            .map_err(Self::translate_vote_err)?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted)
    }

    /// Count votes per option for a poll, ordered by option position.
    pub async fn count_votes(&self, poll_id: i64) -> AppResult<Vec<OptionVoteCount>> {
        let options = self.find_options(poll_id).await?;

        let mut counts = Vec::with_capacity(options.len());
        for option in options {
            let vote_count = PollResponse::find()
                .filter(poll_response::Column::OptionId.eq(option.id))
                .count(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            counts.push(OptionVoteCount {
                option,
                vote_count: vote_count as i64,
            });
        }
        Ok(counts)
    }

    fn response_model(
        poll_id: i64,
        option_id: i64,
        attendee_id: i64,
    ) -> poll_response::ActiveModel {
        poll_response::ActiveModel {
            poll_id: Set(poll_id),
            option_id: Set(option_id),
            attendee_id: Set(attendee_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
    }

    fn translate_vote_err(e: DbErr) -> AppError {
        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            AppError::DuplicateVote("Vote already recorded for this option".to_string())
        } else {
            AppError::Database(e.to_string())
        }
    }
}
