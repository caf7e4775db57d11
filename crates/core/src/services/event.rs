//! Event service.

use chrono::Utc;
use liveq_common::{
    AppError, AppResult, CodeGenerator, is_valid_custom_host_code, is_valid_slug,
};
use liveq_db::{entities::event, repositories::EventRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Input for creating an event.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(custom(function = validate_slug))]
    pub slug: String,
    #[validate(length(max = 1000, message = "Description is too long (max 1000 chars)"))]
    pub description: Option<String>,
    /// Optional custom host code; generated when absent.
    #[validate(custom(function = validate_custom_host_code))]
    pub host_code: Option<String>,
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("slug")
            .with_message("Slug must be 3-50 lowercase alphanumeric characters or hyphens".into()))
    }
}

fn validate_custom_host_code(code: &str) -> Result<(), ValidationError> {
    if is_valid_custom_host_code(code) {
        Ok(())
    } else {
        Err(ValidationError::new("host_code").with_message(
            "Host code must be 3-30 alphanumeric characters, hyphens or underscores".into(),
        ))
    }
}

/// Event service for business logic.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    codes: CodeGenerator,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub const fn new(event_repo: EventRepository) -> Self {
        Self {
            event_repo,
            codes: CodeGenerator::new(),
        }
    }

    /// Create an event.
    ///
    /// Slug, short code and host code are immutable after creation. A
    /// custom host code is prefixed with `host_` so it shares the shape
    /// of generated codes.
    pub async fn create_event(&self, input: CreateEventInput) -> AppResult<event::Model> {
        input.validate()?;

        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title cannot be empty".to_string()));
        }

        let host_code = match input.host_code {
            Some(custom) => format!("host_{custom}"),
            None => self.codes.generate_host_code(),
        };

        let model = event::ActiveModel {
            title: Set(title.to_string()),
            slug: Set(input.slug),
            description: Set(input.description),
            short_code: Set(self.codes.generate_short_code()),
            host_code: Set(host_code),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.event_repo.create(model).await
    }

    /// Get an event by its public slug.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<event::Model> {
        self.event_repo.get_by_slug(slug).await
    }

    /// Get an event by ID.
    pub async fn get_by_id(&self, event_id: i64) -> AppResult<event::Model> {
        self.event_repo.get_by_id(event_id).await
    }

    /// Get the host view of an event, checking the host code.
    pub async fn get_for_host(&self, slug: &str, host_code: &str) -> AppResult<event::Model> {
        let event = self.event_repo.get_by_slug(slug).await?;
        Self::verify_host(&event, host_code)?;
        Ok(event)
    }

    /// Get an event by ID, checking the host code.
    pub async fn get_by_id_for_host(
        &self,
        event_id: i64,
        host_code: &str,
    ) -> AppResult<event::Model> {
        let event = self.event_repo.get_by_id(event_id).await?;
        Self::verify_host(&event, host_code)?;
        Ok(event)
    }

    /// List the events created with a host code, newest first, with the
    /// total across all pages.
    pub async fn list_for_host(
        &self,
        host_code: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<event::Model>, u64)> {
        let events = self
            .event_repo
            .find_by_host_code(host_code, limit, offset)
            .await?;
        let total = self.event_repo.count_by_host_code(host_code).await?;
        Ok((events, total))
    }

    /// Check a presented host code against an event's stored code.
    pub fn verify_host(event: &event::Model, host_code: &str) -> AppResult<()> {
        if event.host_code == host_code {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service() -> EventService {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        EventService::new(EventRepository::new(Arc::new(db)))
    }

    fn input(title: &str, slug: &str) -> CreateEventInput {
        CreateEventInput {
            title: title.to_string(),
            slug: slug.to_string(),
            description: None,
            host_code: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let result = service().create_event(input("   ", "my-event")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_long_title() {
        let result = service()
            .create_event(input(&"x".repeat(201), "my-event"))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_slug() {
        for slug in ["AB", "Has-Upper", "no spaces", "ab"] {
            let result = service().create_event(input("Town Hall", slug)).await;
            assert!(matches!(result, Err(AppError::Validation(_))), "slug {slug}");
        }
    }

    #[tokio::test]
    async fn test_create_rejects_long_description() {
        let mut i = input("Town Hall", "town-hall");
        i.description = Some("d".repeat(1001));
        let result = service().create_event(i).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_custom_host_code() {
        let mut i = input("Town Hall", "town-hall");
        i.host_code = Some("has spaces".to_string());
        let result = service().create_event(i).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_verify_host() {
        let event = event::Model {
            id: 1,
            title: "Town Hall".to_string(),
            slug: "town-hall".to_string(),
            description: None,
            short_code: "ABCD1234".to_string(),
            host_code: "host_abc123def456".to_string(),
            is_active: true,
            created_at: chrono::Utc::now().into(),
        };

        assert!(EventService::verify_host(&event, "host_abc123def456").is_ok());
        assert!(matches!(
            EventService::verify_host(&event, "host_wrong"),
            Err(AppError::Unauthorized)
        ));
    }
}
