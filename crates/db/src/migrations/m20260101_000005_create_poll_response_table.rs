//! Create poll_responses table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PollResponse::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PollResponse::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PollResponse::PollId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PollResponse::OptionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PollResponse::AttendeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PollResponse::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_response_poll")
                            .from(PollResponse::Table, PollResponse::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_response_option")
                            .from(PollResponse::Table, PollResponse::OptionId)
                            .to(PollOption::Table, PollOption::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_response_attendee")
                            .from(PollResponse::Table, PollResponse::AttendeeId)
                            .to(Attendee::Table, Attendee::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (poll_id, option_id, attendee_id) - storage backstop
        // against duplicate votes racing past the application-level check
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_response_poll_option_attendee")
                    .table(PollResponse::Table)
                    .col(PollResponse::PollId)
                    .col(PollResponse::OptionId)
                    .col(PollResponse::AttendeeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (poll_id, attendee_id) (single-choice replace path)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_response_poll_attendee")
                    .table(PollResponse::Table)
                    .col(PollResponse::PollId)
                    .col(PollResponse::AttendeeId)
                    .to_owned(),
            )
            .await?;

        // Index: option_id (for counting votes per option)
        manager
            .create_index(
                Index::create()
                    .name("idx_poll_response_option_id")
                    .table(PollResponse::Table)
                    .col(PollResponse::OptionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PollResponse::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PollResponse {
    #[iden = "poll_responses"]
    Table,
    Id,
    PollId,
    OptionId,
    AttendeeId,
    CreatedAt,
}

#[derive(Iden)]
enum Poll {
    #[iden = "polls"]
    Table,
    Id,
}

#[derive(Iden)]
enum PollOption {
    #[iden = "poll_options"]
    Table,
    Id,
}

#[derive(Iden)]
enum Attendee {
    #[iden = "attendees"]
    Table,
    Id,
}
