//! Create questions table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Question::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Question::EventId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Question::AttendeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Question::QuestionText).text().not_null())
                    .col(
                        ColumnDef::new(Question::IsAnswered)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Question::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_event")
                            .from(Question::Table, Question::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_attendee")
                            .from(Question::Table, Question::AttendeeId)
                            .to(Attendee::Table, Attendee::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: event_id (for listing an event's questions)
        manager
            .create_index(
                Index::create()
                    .name("idx_question_event_id")
                    .table(Question::Table)
                    .col(Question::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Question {
    #[iden = "questions"]
    Table,
    Id,
    EventId,
    AttendeeId,
    QuestionText,
    IsAnswered,
    CreatedAt,
}

#[derive(Iden)]
enum Event {
    #[iden = "events"]
    Table,
    Id,
}

#[derive(Iden)]
enum Attendee {
    #[iden = "attendees"]
    Table,
    Id,
}
