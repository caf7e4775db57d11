//! Create polls table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Poll::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Poll::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Poll::EventId).big_integer().not_null())
                    .col(ColumnDef::new(Poll::QuestionText).text().not_null())
                    .col(
                        ColumnDef::new(Poll::PollType)
                            .string_len(16)
                            .not_null()
                            .default("single"),
                    )
                    .col(
                        ColumnDef::new(Poll::Status)
                            .string_len(16)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Poll::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_event")
                            .from(Poll::Table, Poll::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: event_id (for listing an event's polls)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_event_id")
                    .table(Poll::Table)
                    .col(Poll::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Poll::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Poll {
    #[iden = "polls"]
    Table,
    Id,
    EventId,
    QuestionText,
    PollType,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Event {
    #[iden = "events"]
    Table,
    Id,
}
