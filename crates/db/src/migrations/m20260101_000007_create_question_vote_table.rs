//! Create question_votes table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QuestionVote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestionVote::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(QuestionVote::QuestionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionVote::AttendeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_vote_question")
                            .from(QuestionVote::Table, QuestionVote::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_vote_attendee")
                            .from(QuestionVote::Table, QuestionVote::AttendeeId)
                            .to(Attendee::Table, Attendee::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (question_id, attendee_id) - one toggled upvote
        // per attendee per question
        manager
            .create_index(
                Index::create()
                    .name("idx_question_vote_question_attendee")
                    .table(QuestionVote::Table)
                    .col(QuestionVote::QuestionId)
                    .col(QuestionVote::AttendeeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuestionVote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum QuestionVote {
    #[iden = "question_votes"]
    Table,
    Id,
    QuestionId,
    AttendeeId,
    CreatedAt,
}

#[derive(Iden)]
enum Question {
    #[iden = "questions"]
    Table,
    Id,
}

#[derive(Iden)]
enum Attendee {
    #[iden = "attendees"]
    Table,
    Id,
}
