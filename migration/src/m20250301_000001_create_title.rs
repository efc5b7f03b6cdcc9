use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Title::Table)
                    .if_not_exists()
                    .col(string(Title::Id).primary_key())
                    .col(integer(Title::TmdbId))
                    .col(string(Title::MediaType))
                    .col(string(Title::Source))
                    .col(string(Title::Title))
                    .col(string_null(Title::OriginalTitle))
                    .col(text_null(Title::Overview))
                    .col(string_null(Title::PosterPath))
                    .col(string_null(Title::BackdropPath))
                    .col(integer_null(Title::RuntimeMinutes))
                    .col(text(Title::Genres))
                    .col(string_null(Title::ReleaseDate))
                    .col(big_integer(Title::CreatedAt))
                    .col(big_integer(Title::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_title_tmdb_media_unique")
                    .table(Title::Table)
                    .col(Title::TmdbId)
                    .col(Title::MediaType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_title_created_at")
                    .table(Title::Table)
                    .col(Title::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Title::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Title {
    Table,
    Id,
    TmdbId,
    MediaType,
    Source,
    Title,
    OriginalTitle,
    Overview,
    PosterPath,
    BackdropPath,
    RuntimeMinutes,
    Genres,
    ReleaseDate,
    CreatedAt,
    UpdatedAt,
}
