//! Create events table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Event::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Event::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Event::Slug).string_len(50).not_null())
                    .col(ColumnDef::new(Event::Description).text())
                    .col(ColumnDef::new(Event::ShortCode).string_len(8).not_null())
                    .col(ColumnDef::new(Event::HostCode).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Event::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Event::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: slug (attendee lookup path)
        manager
            .create_index(
                Index::create()
                    .name("idx_event_slug")
                    .table(Event::Table)
                    .col(Event::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: short_code
        manager
            .create_index(
                Index::create()
                    .name("idx_event_short_code")
                    .table(Event::Table)
                    .col(Event::ShortCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: host_code (custom codes must not collide)
        manager
            .create_index(
                Index::create()
                    .name("idx_event_host_code")
                    .table(Event::Table)
                    .col(Event::HostCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Event {
    #[iden = "events"]
    Table,
    Id,
    Title,
    Slug,
    Description,
    ShortCode,
    HostCode,
    IsActive,
    CreatedAt,
}
