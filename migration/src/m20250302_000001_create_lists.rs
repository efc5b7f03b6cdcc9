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
                    .table(List::Table)
                    .if_not_exists()
                    .col(string(List::Id).primary_key())
                    .col(string(List::UserId))
                    .col(string(List::Name))
                    .col(text_null(List::Description))
                    .col(string(List::Privacy))
                    .col(big_integer(List::CreatedAt))
                    .col(big_integer(List::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_list_user")
                            .from(List::Table, List::UserId)
                            .to(AuthUser::Table, AuthUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_list_user_updated")
                    .table(List::Table)
                    .col(List::UserId)
                    .col(List::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ListItem::Table)
                    .if_not_exists()
                    .col(string(ListItem::Id).primary_key())
                    .col(string(ListItem::ListId))
                    .col(string(ListItem::TitleId))
                    .col(integer(ListItem::Rank))
                    .col(text_null(ListItem::Note))
                    .col(big_integer(ListItem::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_list_item_list")
                            .from(ListItem::Table, ListItem::ListId)
                            .to(List::Table, List::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_list_item_title")
                            .from(ListItem::Table, ListItem::TitleId)
                            .to(Title::Table, Title::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_list_item_rank_unique")
                    .table(ListItem::Table)
                    .col(ListItem::ListId)
                    .col(ListItem::Rank)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ListItem::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(List::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum List {
    Table,
    Id,
    UserId,
    Name,
    Description,
    Privacy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ListItem {
    Table,
    Id,
    ListId,
    TitleId,
    Rank,
    Note,
    CreatedAt,
}
