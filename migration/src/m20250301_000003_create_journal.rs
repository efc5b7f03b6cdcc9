use sea_orm_migration::{prelude::*, schema::*};

use crate::{m20250301_000001_create_title::Title, m20250301_000002_create_auth::AuthUser};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(string(Review::Id).primary_key())
                    .col(string(Review::TitleId))
                    .col(string_null(Review::UserId))
                    .col(string_null(Review::WatchedOn))
                    .col(double_null(Review::Rating))
                    .col(boolean(Review::ContainsSpoilers))
                    .col(boolean(Review::Liked))
                    .col(text(Review::Body))
                    .col(big_integer(Review::CreatedAt))
                    .col(big_integer(Review::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_title")
                            .from(Review::Table, Review::TitleId)
                            .to(Title::Table, Title::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_user")
                            .from(Review::Table, Review::UserId)
                            .to(AuthUser::Table, AuthUser::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_review_title_user")
                    .table(Review::Table)
                    .col(Review::TitleId)
                    .col(Review::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tag::Table)
                    .if_not_exists()
                    .col(pk_auto(Tag::Id))
                    .col(string_uniq(Tag::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReviewTag::Table)
                    .if_not_exists()
                    .col(string(ReviewTag::ReviewId))
                    .col(integer(ReviewTag::TagId))
                    .primary_key(Index::create().col(ReviewTag::ReviewId).col(ReviewTag::TagId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_tag_review")
                            .from(ReviewTag::Table, ReviewTag::ReviewId)
                            .to(Review::Table, Review::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_tag_tag")
                            .from(ReviewTag::Table, ReviewTag::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DiaryEntry::Table)
                    .if_not_exists()
                    .col(string(DiaryEntry::Id).primary_key())
                    .col(string(DiaryEntry::TitleId))
                    .col(string(DiaryEntry::WatchedOn))
                    .col(double_null(DiaryEntry::Rating))
                    .col(boolean(DiaryEntry::Liked))
                    .col(boolean(DiaryEntry::Rewatch))
                    .col(text_null(DiaryEntry::Notes))
                    .col(big_integer(DiaryEntry::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_diary_entry_title")
                            .from(DiaryEntry::Table, DiaryEntry::TitleId)
                            .to(Title::Table, Title::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_diary_entry_watched_on")
                    .table(DiaryEntry::Table)
                    .col(DiaryEntry::WatchedOn)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(DiaryEntry::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(ReviewTag::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Tag::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Review::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Review {
    Table,
    Id,
    TitleId,
    UserId,
    WatchedOn,
    Rating,
    ContainsSpoilers,
    Liked,
    Body,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tag {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum ReviewTag {
    Table,
    ReviewId,
    TagId,
}

#[derive(DeriveIden)]
enum DiaryEntry {
    Table,
    Id,
    TitleId,
    WatchedOn,
    Rating,
    Liked,
    Rewatch,
    Notes,
    CreatedAt,
}
