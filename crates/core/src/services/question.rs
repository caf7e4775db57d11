//! Question service: submission, the upvote toggle and host moderation-lite.

use crate::services::broadcast::BroadcasterService;
use chrono::Utc;
use liveq_common::{AppError, AppResult};
use liveq_db::{entities::question, repositories::QuestionRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Input for submitting a question.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuestionInput {
    #[validate(length(min = 1, max = 1000, message = "Question must be 1-1000 characters"))]
    pub question_text: String,
}

/// A question as exposed over the API and the stream.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub event_id: i64,
    pub question_text: String,
    pub is_answered: bool,
    pub upvote_count: i64,
    pub created_at: i64,
}

impl QuestionView {
    fn from_model(question: question::Model, upvote_count: i64) -> Self {
        Self {
            id: question.id,
            event_id: question.event_id,
            question_text: question.question_text,
            is_answered: question.is_answered,
            upvote_count,
            created_at: question.created_at.timestamp_millis(),
        }
    }
}

/// Result of an upvote toggle.
#[derive(Debug, Clone, Serialize)]
pub struct UpvoteOutcome {
    pub question_id: i64,
    /// `"added"` or `"removed"`.
    pub action: &'static str,
    pub upvote_count: i64,
}

/// Question service for business logic.
#[derive(Clone)]
pub struct QuestionService {
    question_repo: QuestionRepository,
    broadcaster: Option<BroadcasterService>,
}

impl QuestionService {
    /// Create a new question service.
    #[must_use]
    pub const fn new(question_repo: QuestionRepository) -> Self {
        Self {
            question_repo,
            broadcaster: None,
        }
    }

    /// Set the event broadcaster.
    pub fn set_broadcaster(&mut self, broadcaster: BroadcasterService) {
        self.broadcaster = Some(broadcaster);
    }

    /// Submit a question to an event.
    pub async fn submit(
        &self,
        event_id: i64,
        attendee_id: i64,
        input: SubmitQuestionInput,
    ) -> AppResult<QuestionView> {
        input.validate()?;

        let text = input.question_text.trim();
        if text.is_empty() {
            return Err(AppError::Validation(
                "Question cannot be empty".to_string(),
            ));
        }

        let model = question::ActiveModel {
            event_id: Set(event_id),
            attendee_id: Set(attendee_id),
            question_text: Set(text.to_string()),
            is_answered: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = self.question_repo.create(model).await?;
        let view = QuestionView::from_model(created, 0);

        if let Some(ref broadcaster) = self.broadcaster {
            match serde_json::to_value(&view) {
                Ok(question) => {
                    let payload = serde_json::json!({ "question": question });
                    if let Err(e) = broadcaster.question_submitted(event_id, payload).await {
                        tracing::warn!(error = %e, "Failed to broadcast question event");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to serialize question payload"),
            }
        }

        Ok(view)
    }

    /// Toggle an attendee's upvote on a question.
    ///
    /// An existing upvote is removed, a missing one is added; repeating the
    /// call alternates deterministically. Returns the action taken and the
    /// fresh count.
    pub async fn upvote(
        &self,
        event_id: i64,
        question_id: i64,
        attendee_id: i64,
    ) -> AppResult<UpvoteOutcome> {
        let question = self.get_in_event(event_id, question_id).await?;

        let action = match self
            .question_repo
            .find_vote(question_id, attendee_id)
            .await?
        {
            Some(existing) => {
                self.question_repo.delete_vote(existing).await?;
                "removed"
            }
            None => {
                self.question_repo.insert_vote(question_id, attendee_id).await?;
                "added"
            }
        };

        let upvote_count = self.question_repo.count_votes(question_id).await?;
        let outcome = UpvoteOutcome {
            question_id: question.id,
            action,
            upvote_count,
        };

        if let Some(ref broadcaster) = self.broadcaster {
            match serde_json::to_value(&outcome) {
                Ok(payload) => {
                    if let Err(e) = broadcaster.question_upvoted(event_id, payload).await {
                        tracing::warn!(error = %e, "Failed to broadcast upvote event");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to serialize upvote payload"),
            }
        }

        Ok(outcome)
    }

    /// Flip a question's answered flag (host action).
    pub async fn toggle_answered(
        &self,
        event_id: i64,
        question_id: i64,
    ) -> AppResult<QuestionView> {
        let question = self.get_in_event(event_id, question_id).await?;
        let flipped = !question.is_answered;
        let updated = self.question_repo.set_answered(question, flipped).await?;
        let upvote_count = self.question_repo.count_votes(question_id).await?;
        Ok(QuestionView::from_model(updated, upvote_count))
    }

    /// List an event's questions, most upvoted first, ties in submission
    /// order.
    pub async fn list(&self, event_id: i64) -> AppResult<Vec<QuestionView>> {
        let questions = self.question_repo.find_by_event(event_id).await?;

        let mut views = Vec::with_capacity(questions.len());
        for question in questions {
            let upvote_count = self.question_repo.count_votes(question.id).await?;
            views.push(QuestionView::from_model(question, upvote_count));
        }

        // find_by_event yields submission order; a stable sort on count
        // preserves it within ties.
        views.sort_by(|a, b| b.upvote_count.cmp(&a.upvote_count));
        Ok(views)
    }

    /// Number of questions submitted to an event.
    pub async fn count(&self, event_id: i64) -> AppResult<i64> {
        self.question_repo.count_by_event(event_id).await
    }

    async fn get_in_event(&self, event_id: i64, question_id: i64) -> AppResult<question::Model> {
        let question = self.question_repo.get_by_id(question_id).await?;
        if question.event_id != event_id {
            return Err(AppError::NotFound(format!(
                "Question not found: {question_id}"
            )));
        }
        Ok(question)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use liveq_db::entities::question_vote;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;

    fn service_with(db: MockDatabase) -> QuestionService {
        QuestionService::new(QuestionRepository::new(Arc::new(db.into_connection())))
    }

    fn service() -> QuestionService {
        service_with(MockDatabase::new(DatabaseBackend::Postgres))
    }

    fn question_model() -> question::Model {
        question::Model {
            id: 9,
            event_id: 1,
            attendee_id: 42,
            question_text: "When is lunch?".to_string(),
            is_answered: false,
            created_at: Utc::now().into(),
        }
    }

    fn vote_model() -> question_vote::Model {
        question_vote::Model {
            id: 5,
            question_id: 9,
            attendee_id: 42,
            created_at: Utc::now().into(),
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
        btreemap! { "num_items" => Value::BigInt(Some(n)) }
    }

    fn submit_input(text: &str) -> SubmitQuestionInput {
        SubmitQuestionInput {
            question_text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_text() {
        let result = service().submit(1, 42, submit_input("   ")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_rejects_long_text() {
        let result = service().submit(1, 42, submit_input(&"q".repeat(1001))).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_question_submitted_broadcast_nests_question() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 9,
                rows_affected: 1,
            }])
            .append_query_results([vec![question_model()]]);

        let recorder = Arc::new(
            crate::services::broadcast::testing::RecordingBroadcaster::default(),
        );
        let mut service = service_with(db);
        service.set_broadcaster(recorder.clone());

        service
            .submit(1, 42, submit_input("When is lunch?"))
            .await
            .unwrap();

        let frames = recorder.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, "question_submitted");
        assert_eq!(frames[0].1["question"]["question_text"], "When is lunch?");
        assert_eq!(frames[0].1["question"]["upvote_count"], 0);
    }

    #[tokio::test]
    async fn test_upvote_adds_when_absent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![question_model()]])
            .append_query_results([Vec::<question_vote::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 5,
                rows_affected: 1,
            }])
            .append_query_results([vec![vote_model()]])
            .append_query_results([vec![count_row(1)]]);

        let outcome = service_with(db).upvote(1, 9, 42).await.unwrap();
        assert_eq!(outcome.action, "added");
        assert_eq!(outcome.upvote_count, 1);
    }

    #[tokio::test]
    async fn test_upvote_removes_when_present() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![question_model()]])
            .append_query_results([vec![vote_model()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![count_row(0)]]);

        let outcome = service_with(db).upvote(1, 9, 42).await.unwrap();
        assert_eq!(outcome.action, "removed");
        assert_eq!(outcome.upvote_count, 0);
    }

    #[tokio::test]
    async fn test_upvote_rejects_question_outside_event() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![question_model()]]);
        let result = service_with(db).upvote(99, 9, 42).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
