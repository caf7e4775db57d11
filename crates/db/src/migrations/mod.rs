//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_event_table;
mod m20260101_000002_create_attendee_table;
mod m20260101_000003_create_poll_table;
mod m20260101_000004_create_poll_option_table;
mod m20260101_000005_create_poll_response_table;
mod m20260101_000006_create_question_table;
mod m20260101_000007_create_question_vote_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_event_table::Migration),
            Box::new(m20260101_000002_create_attendee_table::Migration),
            Box::new(m20260101_000003_create_poll_table::Migration),
            Box::new(m20260101_000004_create_poll_option_table::Migration),
            Box::new(m20260101_000005_create_poll_response_table::Migration),
            Box::new(m20260101_000006_create_question_table::Migration),
            Box::new(m20260101_000007_create_question_vote_table::Migration),
        ]
    }
}
