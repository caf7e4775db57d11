//! Create attendees table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attendee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attendee::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attendee::EventId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Attendee::SessionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Attendee::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendee_event")
                            .from(Attendee::Table, Attendee::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (event_id, session_id) - authoritative for
        // find-or-create races; exactly one attendee per token per event
        manager
            .create_index(
                Index::create()
                    .name("idx_attendee_event_session")
                    .table(Attendee::Table)
                    .col(Attendee::EventId)
                    .col(Attendee::SessionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attendee::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Attendee {
    #[iden = "attendees"]
    Table,
    Id,
    EventId,
    SessionId,
    CreatedAt,
}

#[derive(Iden)]
enum Event {
    #[iden = "events"]
    Table,
    Id,
}
