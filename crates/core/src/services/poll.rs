//! Poll service: creation, status transitions, the vote ledger and results.

use crate::services::broadcast::BroadcasterService;
use chrono::Utc;
use liveq_common::{AppError, AppResult};
use liveq_db::{
    entities::{
        poll::{self, PollStatus, PollType},
        poll_option,
    },
    repositories::{OptionVoteCount, PollRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Maximum length of an option label.
const MAX_OPTION_LEN: usize = 500;

/// Input for creating a poll.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePollInput {
    #[validate(length(min = 1, max = 500, message = "Poll question must be 1-500 characters"))]
    pub question_text: String,
    pub poll_type: PollType,
    #[validate(
        length(min = 2, max = 10, message = "Poll must have 2-10 options"),
        custom(function = validate_options)
    )]
    pub options: Vec<String>,
}

fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    for option in options {
        if option.trim().is_empty() {
            return Err(ValidationError::new("options")
                .with_message("Poll options cannot be empty".into()));
        }
        if option.len() > MAX_OPTION_LEN {
            return Err(ValidationError::new("options")
                .with_message("Poll option is too long (max 500 chars)".into()));
        }
    }
    Ok(())
}

/// A poll option as exposed over the API and the stream.
#[derive(Debug, Clone, Serialize)]
pub struct PollOptionView {
    pub id: i64,
    pub option_text: String,
    pub position: i32,
}

/// A poll with its options.
#[derive(Debug, Clone, Serialize)]
pub struct PollView {
    pub id: i64,
    pub event_id: i64,
    pub question_text: String,
    pub poll_type: PollType,
    pub status: PollStatus,
    pub options: Vec<PollOptionView>,
    pub created_at: i64,
}

impl PollView {
    fn from_parts(poll: poll::Model, options: Vec<poll_option::Model>) -> Self {
        Self {
            id: poll.id,
            event_id: poll.event_id,
            question_text: poll.question_text,
            poll_type: poll.poll_type,
            status: poll.status,
            options: options
                .into_iter()
                .map(|o| PollOptionView {
                    id: o.id,
                    option_text: o.option_text,
                    position: o.position,
                })
                .collect(),
            created_at: poll.created_at.timestamp_millis(),
        }
    }
}

/// Vote counts for one option.
#[derive(Debug, Clone, Serialize)]
pub struct OptionResult {
    pub option_id: i64,
    pub option_text: String,
    pub position: i32,
    pub vote_count: i64,
}

impl From<OptionVoteCount> for OptionResult {
    fn from(count: OptionVoteCount) -> Self {
        Self {
            option_id: count.option.id,
            option_text: count.option.option_text,
            position: count.option.position,
            vote_count: count.vote_count,
        }
    }
}

/// Poll results, ordered by option position.
#[derive(Debug, Clone, Serialize)]
pub struct PollResults {
    pub poll_id: i64,
    pub status: PollStatus,
    pub total_votes: i64,
    pub results: Vec<OptionResult>,
}

/// A poll with per-option vote counts, as embedded in the host view.
#[derive(Debug, Clone, Serialize)]
pub struct PollWithResults {
    pub id: i64,
    pub event_id: i64,
    pub question_text: String,
    pub poll_type: PollType,
    pub status: PollStatus,
    pub options: Vec<OptionResult>,
    pub created_at: i64,
}

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    broadcaster: Option<BroadcasterService>,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository) -> Self {
        Self {
            poll_repo,
            broadcaster: None,
        }
    }

    /// Set the event broadcaster.
    pub fn set_broadcaster(&mut self, broadcaster: BroadcasterService) {
        self.broadcaster = Some(broadcaster);
    }

    /// Create a poll with its options. New polls start in `draft`.
    pub async fn create_poll(
        &self,
        event_id: i64,
        input: CreatePollInput,
    ) -> AppResult<PollView> {
        input.validate()?;

        let question = input.question_text.trim();
        if question.is_empty() {
            return Err(AppError::Validation(
                "Poll question cannot be empty".to_string(),
            ));
        }

        let poll = poll::ActiveModel {
            event_id: Set(event_id),
            question_text: Set(question.to_string()),
            poll_type: Set(input.poll_type),
            status: Set(PollStatus::Draft),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let options = input
            .options
            .into_iter()
            .enumerate()
            .map(|(position, text)| poll_option::ActiveModel {
                option_text: Set(text.trim().to_string()),
                position: Set(position as i32),
                ..Default::default()
            })
            .collect();

        let (created, created_options) =
            self.poll_repo.create_with_options(poll, options).await?;
        let view = PollView::from_parts(created, created_options);

        if let Some(ref broadcaster) = self.broadcaster {
            match serde_json::to_value(&view) {
                Ok(poll) => {
                    let payload = serde_json::json!({ "poll": poll });
                    if let Err(e) = broadcaster.poll_created(event_id, payload).await {
                        tracing::warn!(error = %e, "Failed to broadcast poll created event");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to serialize poll payload"),
            }
        }

        Ok(view)
    }

    /// Get a poll with its options, scoped to an event.
    pub async fn get_poll(&self, event_id: i64, poll_id: i64) -> AppResult<PollView> {
        let poll = self.get_in_event(event_id, poll_id).await?;
        let options = self.poll_repo.find_options(poll_id).await?;
        Ok(PollView::from_parts(poll, options))
    }

    /// Transition a poll's status.
    ///
    /// Any transition between draft, active and closed is allowed; a closed
    /// poll can be reactivated. Voting is gated on `active` elsewhere.
    pub async fn update_status(
        &self,
        event_id: i64,
        poll_id: i64,
        status: PollStatus,
    ) -> AppResult<PollView> {
        let poll = self.get_in_event(event_id, poll_id).await?;
        let updated = self.poll_repo.update_status(poll, status).await?;
        let options = self.poll_repo.find_options(poll_id).await?;
        let view = PollView::from_parts(updated, options);

        if let Some(ref broadcaster) = self.broadcaster {
            let payload = serde_json::json!({
                "poll_id": poll_id,
                "status": status,
            });
            if let Err(e) = broadcaster.poll_status_updated(event_id, payload).await {
                tracing::warn!(error = %e, "Failed to broadcast poll status event");
            }
        }

        Ok(view)
    }

    /// Record an attendee's vote and broadcast the fresh results.
    ///
    /// The poll must be `active`. Single-choice polls replace any previous
    /// response by this attendee; multiple-choice polls reject a repeat
    /// vote for the same option as `DuplicateVote`.
    pub async fn cast_vote(
        &self,
        event_id: i64,
        poll_id: i64,
        option_id: i64,
        attendee_id: i64,
    ) -> AppResult<PollResults> {
        let poll = self.get_in_event(event_id, poll_id).await?;

        if poll.status != PollStatus::Active {
            return Err(AppError::InvalidState(
                "Poll is not accepting votes".to_string(),
            ));
        }

        self.poll_repo
            .find_option_in_poll(option_id, poll_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Option not found: {option_id}")))?;

        match poll.poll_type {
            PollType::Single => {
                self.poll_repo
                    .replace_vote(poll_id, option_id, attendee_id)
                    .await?;
            }
            PollType::Multiple => {
                self.poll_repo
                    .insert_vote(poll_id, option_id, attendee_id)
                    .await?;
            }
        }

        let results = self.collect_results(&poll).await?;

        if let Some(ref broadcaster) = self.broadcaster {
            match serde_json::to_value(&results) {
                Ok(payload) => {
                    if let Err(e) = broadcaster.vote_updated(event_id, payload).await {
                        tracing::warn!(error = %e, "Failed to broadcast vote event");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to serialize results payload"),
            }
        }

        Ok(results)
    }

    /// Get current results for a poll, ordered by option position.
    pub async fn get_results(&self, event_id: i64, poll_id: i64) -> AppResult<PollResults> {
        let poll = self.get_in_event(event_id, poll_id).await?;
        self.collect_results(&poll).await
    }

    /// List an event's polls with live vote counts, in creation order.
    pub async fn list_with_results(&self, event_id: i64) -> AppResult<Vec<PollWithResults>> {
        let polls = self.poll_repo.find_by_event(event_id).await?;

        let mut views = Vec::with_capacity(polls.len());
        for poll in polls {
            let counts = self.poll_repo.count_votes(poll.id).await?;
            views.push(PollWithResults {
                id: poll.id,
                event_id: poll.event_id,
                question_text: poll.question_text,
                poll_type: poll.poll_type,
                status: poll.status,
                options: counts.into_iter().map(Into::into).collect(),
                created_at: poll.created_at.timestamp_millis(),
            });
        }
        Ok(views)
    }

    async fn get_in_event(&self, event_id: i64, poll_id: i64) -> AppResult<poll::Model> {
        let poll = self.poll_repo.get_by_id(poll_id).await?;
        if poll.event_id != event_id {
            return Err(AppError::NotFound(format!("Poll not found: {poll_id}")));
        }
        Ok(poll)
    }

    async fn collect_results(&self, poll: &poll::Model) -> AppResult<PollResults> {
        let counts = self.poll_repo.count_votes(poll.id).await?;
        let total_votes = counts.iter().map(|c| c.vote_count).sum();
        let results = counts.into_iter().map(Into::into).collect();

        Ok(PollResults {
            poll_id: poll.id,
            status: poll.status,
            total_votes,
            results,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::broadcast::testing::RecordingBroadcaster;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service_with(db: MockDatabase) -> PollService {
        PollService::new(PollRepository::new(Arc::new(db.into_connection())))
    }

    fn option_model(id: i64, text: &str, position: i32) -> poll_option::Model {
        poll_option::Model {
            id,
            poll_id: 7,
            option_text: text.to_string(),
            position,
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    fn exec(last_insert_id: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id,
            rows_affected: 1,
        }
    }

    fn service() -> PollService {
        service_with(MockDatabase::new(DatabaseBackend::Postgres))
    }

    fn input(options: &[&str]) -> CreatePollInput {
        CreatePollInput {
            question_text: "Favorite language?".to_string(),
            poll_type: PollType::Single,
            options: options.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn poll_model(status: PollStatus, poll_type: PollType) -> poll::Model {
        poll::Model {
            id: 7,
            event_id: 1,
            question_text: "Favorite language?".to_string(),
            poll_type,
            status,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_too_few_options() {
        let result = service().create_poll(1, input(&["Rust"])).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_too_many_options() {
        let options: Vec<String> = (0..11).map(|i| format!("Option {i}")).collect();
        let refs: Vec<&str> = options.iter().map(String::as_str).collect();
        let result = service().create_poll(1, input(&refs)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_option() {
        let result = service().create_poll(1, input(&["Rust", "  "])).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_question() {
        let mut i = input(&["Rust", "Go"]);
        i.question_text = "  ".to_string();
        let result = service().create_poll(1, i).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_vote_requires_active_poll() {
        for status in [PollStatus::Draft, PollStatus::Closed] {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![poll_model(status, PollType::Single)]]);
            let result = service_with(db).cast_vote(1, 7, 3, 42).await;
            assert!(matches!(result, Err(AppError::InvalidState(_))));
        }
    }

    #[tokio::test]
    async fn test_vote_rejects_poll_outside_event() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![poll_model(PollStatus::Active, PollType::Single)]]);
        let result = service_with(db).cast_vote(99, 7, 3, 42).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_closed_poll_can_be_reactivated() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![poll_model(PollStatus::Closed, PollType::Single)]])
            .append_query_results([vec![poll_model(PollStatus::Active, PollType::Single)]])
            .append_query_results([Vec::<poll_option::Model>::new()]);

        let view = service_with(db)
            .update_status(1, 7, PollStatus::Active)
            .await
            .unwrap();
        assert_eq!(view.status, PollStatus::Active);
    }

    #[tokio::test]
    async fn test_poll_created_broadcast_nests_poll() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(7), exec(3), exec(4)])
            .append_query_results([vec![poll_model(PollStatus::Draft, PollType::Single)]])
            .append_query_results([vec![option_model(3, "Rust", 0)]])
            .append_query_results([vec![option_model(4, "Go", 1)]]);

        let recorder = Arc::new(RecordingBroadcaster::default());
        let mut service = service_with(db);
        service.set_broadcaster(recorder.clone());

        service.create_poll(1, input(&["Rust", "Go"])).await.unwrap();

        let frames = recorder.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, "poll_created");
        assert_eq!(frames[0].1["poll"]["id"], 7);
        assert_eq!(frames[0].1["poll"]["options"][0]["option_text"], "Rust");
    }

    #[tokio::test]
    async fn test_list_with_results_embeds_counts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![poll_model(PollStatus::Active, PollType::Single)]])
            .append_query_results([vec![
                option_model(3, "Rust", 0),
                option_model(4, "Go", 1),
            ]])
            .append_query_results([vec![count_row(2)]])
            .append_query_results([vec![count_row(1)]]);

        let views = service_with(db).list_with_results(1).await.unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].options.len(), 2);
        assert_eq!(views[0].options[0].vote_count, 2);
        assert_eq!(views[0].options[1].vote_count, 1);
    }

    #[tokio::test]
    async fn test_vote_rejects_unknown_option() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![poll_model(PollStatus::Active, PollType::Single)]])
            .append_query_results([Vec::<liveq_db::entities::poll_option::Model>::new()]);
        let result = service_with(db).cast_vote(1, 7, 3, 42).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
