use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Func, SimpleExpr},
};

use super::{Store, new_id};
use crate::{
    dates::{self, now_sec},
    entities::{list, list_item, review, title},
    error::{AppError, AppResult},
    models::{LatestReview, ListItemView, Privacy, TitleSummary},
};

/// Highest rank an item may hold.
pub const MAX_RANK: i32 = 10_000;

#[derive(Clone, Debug, Default)]
pub struct ListChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub privacy: Option<Privacy>,
}

#[derive(Clone, Debug)]
pub struct NewListItem {
    pub title_id: String,
    pub rank: Option<i32>,
    pub note: Option<String>,
}

impl Store {
    /// The user's lists, most recently updated first.
    pub async fn lists_for_user(&self, user_id: &str) -> AppResult<Vec<list::Model>> {
        let lists = list::Entity::find()
            .filter(list::Column::UserId.eq(user_id))
            .order_by_desc(list::Column::UpdatedAt)
            .all(&self.db)
            .await?;
        Ok(lists)
    }

    pub async fn create_list(
        &self,
        user_id: &str,
        name: &str,
        description: Option<&str>,
        privacy: Privacy,
    ) -> AppResult<list::Model> {
        let now = now_sec();
        let created = list::Model {
            id: new_id(),
            user_id: user_id.to_string(),
            name: name.trim().to_string(),
            description: super::clean_text(description),
            privacy,
            created_at: now,
            updated_at: now,
        };
        list::Entity::insert(list::ActiveModel {
            id: Set(created.id.clone()),
            user_id: Set(created.user_id.clone()),
            name: Set(created.name.clone()),
            description: Set(created.description.clone()),
            privacy: Set(created.privacy),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .exec_without_returning(&self.db)
        .await?;
        Ok(created)
    }

    /// Loads a list the user owns: 404 when missing, 403 when someone else's.
    pub async fn owned_list(&self, list_id: &str, user_id: &str) -> AppResult<list::Model> {
        let list = list::Entity::find_by_id(list_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("List not found."))?;
        if list.user_id != user_id {
            return Err(AppError::Forbidden("Not allowed.".to_string()));
        }
        Ok(list)
    }

    pub async fn update_list(&self, list: list::Model, changes: ListChanges) -> AppResult<list::Model> {
        let mut active = list.into_active_model();
        if let Some(name) = changes.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = changes.description {
            active.description = Set(super::clean_text(Some(&description)));
        }
        if let Some(privacy) = changes.privacy {
            active.privacy = Set(privacy);
        }
        active.updated_at = Set(now_sec());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes the list and its items together.
    pub async fn delete_list(&self, list_id: &str) -> AppResult<()> {
        let txn = self.db.begin().await?;
        list_item::Entity::delete_many()
            .filter(list_item::Column::ListId.eq(list_id))
            .exec(&txn)
            .await?;
        list::Entity::delete_by_id(list_id.to_string()).exec(&txn).await?;
        txn.commit().await?;
        tracing::debug!(list_id, "deleted list");
        Ok(())
    }

    /// Items in rank order, each with `user_id`'s most recent review of the title.
    pub async fn list_items(&self, list_id: &str, user_id: &str) -> AppResult<Vec<ListItemView>> {
        let rows = list_item::Entity::find()
            .filter(list_item::Column::ListId.eq(list_id))
            .find_also_related(title::Entity)
            .order_by_asc(list_item::Column::Rank)
            .all(&self.db)
            .await?;

        let title_ids: Vec<String> = rows.iter().map(|(item, _)| item.title_id.clone()).collect();
        let mut latest: HashMap<String, review::Model> = HashMap::new();
        if !title_ids.is_empty() {
            let reviews = review::Entity::find()
                .filter(review::Column::UserId.eq(user_id))
                .filter(review::Column::TitleId.is_in(title_ids))
                .order_by_desc(review::Column::CreatedAt)
                .order_by_desc(super::insertion_order(review::Entity))
                .all(&self.db)
                .await?;
            for r in reviews {
                latest.entry(r.title_id.clone()).or_insert(r);
            }
        }

        let views = rows
            .into_iter()
            .filter_map(|(item, title)| {
                let title = title?;
                let latest_review = latest.get(&title.id).map(|r| LatestReview {
                    id: r.id.clone(),
                    rating: r.rating,
                    watched_on: r.watched_on.clone(),
                    created_at: dates::format_timestamp(r.created_at),
                });
                Some(ListItemView {
                    id: item.id,
                    rank: item.rank,
                    note: item.note,
                    title: TitleSummary::from(&title),
                    latest_review,
                })
            })
            .collect();
        Ok(views)
    }

    /// Without a rank the item is appended after the current maximum. An explicit rank
    /// that is already taken pushes that item and everything below it down by one.
    pub async fn add_list_item(&self, list_id: &str, new: NewListItem) -> AppResult<list_item::Model> {
        let now = now_sec();
        let txn = self.db.begin().await?;

        let rank = match new.rank {
            Some(rank) => {
                check_rank(rank)?;
                let occupied = list_item::Entity::find()
                    .filter(list_item::Column::ListId.eq(list_id))
                    .filter(list_item::Column::Rank.eq(rank))
                    .count(&txn)
                    .await?
                    > 0;
                if occupied {
                    // The last occupant moves down one, so it must stay in range too.
                    let last = max_rank(&txn, list_id).await?.unwrap_or(rank);
                    check_rank(last.checked_add(1).unwrap_or(i32::MAX))?;
                    shift_down_from(&txn, list_id, rank).await?;
                }
                rank
            },
            None => {
                let next = max_rank(&txn, list_id).await?.unwrap_or(0).checked_add(1).unwrap_or(i32::MAX);
                check_rank(next)?;
                next
            },
        };

        let item = list_item::Model {
            id: new_id(),
            list_id: list_id.to_string(),
            title_id: new.title_id,
            rank,
            note: super::clean_text(new.note.as_deref()),
            created_at: now,
        };
        list_item::Entity::insert(list_item::ActiveModel {
            id: Set(item.id.clone()),
            list_id: Set(item.list_id.clone()),
            title_id: Set(item.title_id.clone()),
            rank: Set(item.rank),
            note: Set(item.note.clone()),
            created_at: Set(now),
        })
        .exec_without_returning(&txn)
        .await?;
        touch_list(&txn, list_id, now).await?;

        txn.commit().await?;
        tracing::debug!(list_id, item_id = %item.id, rank, "added list item");
        Ok(item)
    }

    /// Assigns the given ranks in one transaction. Every id must belong to the list and the
    /// resulting ranks, including those of items not in `ranks`, must stay unique.
    pub async fn reorder_list_items(&self, list_id: &str, ranks: &[(String, i32)]) -> AppResult<()> {
        let txn = self.db.begin().await?;

        let current: HashMap<String, i32> = list_item::Entity::find()
            .filter(list_item::Column::ListId.eq(list_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|item| (item.id, item.rank))
            .collect();

        let mut moved = HashSet::new();
        for (id, rank) in ranks {
            check_rank(*rank)?;
            if !current.contains_key(id) {
                return Err(AppError::not_found("One or more list items not found."));
            }
            if !moved.insert(id.as_str()) {
                return Err(AppError::bad_request("Each list item may appear only once."));
            }
        }

        let mut taken = HashSet::new();
        let unchanged = current
            .iter()
            .filter(|(id, _)| !moved.contains(id.as_str()))
            .map(|(_, rank)| *rank);
        for rank in unchanged.chain(ranks.iter().map(|(_, rank)| *rank)) {
            if !taken.insert(rank) {
                return Err(AppError::bad_request("Ranks must be unique within a list."));
            }
        }

        // Park moved items on distinct negative ranks first so no step collides.
        for (parked, (id, _)) in (1i32..).zip(ranks) {
            set_rank(&txn, id, -parked).await?;
        }
        for (id, rank) in ranks {
            set_rank(&txn, id, *rank).await?;
        }
        touch_list(&txn, list_id, now_sec()).await?;

        txn.commit().await?;
        tracing::debug!(list_id, moved = ranks.len(), "reordered list items");
        Ok(())
    }

    pub async fn update_list_item_note(
        &self,
        list_id: &str,
        item_id: &str,
        note: Option<&str>,
    ) -> AppResult<list_item::Model> {
        let item = self.list_item_in(list_id, item_id).await?;
        let mut active = item.into_active_model();
        active.note = Set(super::clean_text(note));
        let updated = active.update(&self.db).await?;
        touch_list(&self.db, list_id, now_sec()).await?;
        Ok(updated)
    }

    pub async fn remove_list_item(&self, list_id: &str, item_id: &str) -> AppResult<()> {
        let item = self.list_item_in(list_id, item_id).await?;
        list_item::Entity::delete_by_id(item.id).exec(&self.db).await?;
        touch_list(&self.db, list_id, now_sec()).await?;
        Ok(())
    }

    async fn list_item_in(&self, list_id: &str, item_id: &str) -> AppResult<list_item::Model> {
        list_item::Entity::find_by_id(item_id.to_string())
            .one(&self.db)
            .await?
            .filter(|item| item.list_id == list_id)
            .ok_or_else(|| AppError::not_found("List item not found."))
    }
}

fn check_rank(rank: i32) -> AppResult<()> {
    if (1..=MAX_RANK).contains(&rank) {
        Ok(())
    } else {
        Err(AppError::invalid_field("rank", format!("rank must be between 1 and {MAX_RANK}.")))
    }
}

async fn max_rank<C: ConnectionTrait>(conn: &C, list_id: &str) -> Result<Option<i32>, sea_orm::DbErr> {
    let max = list_item::Entity::find()
        .select_only()
        .column_as(SimpleExpr::from(Func::max(Expr::col(list_item::Column::Rank))), "max_rank")
        .filter(list_item::Column::ListId.eq(list_id))
        .into_tuple::<Option<i32>>()
        .one(conn)
        .await?;
    Ok(max.flatten())
}

/// Adds one to every rank `>= from`, via negated ranks so the unique index holds row by row.
async fn shift_down_from<C: ConnectionTrait>(conn: &C, list_id: &str, from: i32) -> Result<(), sea_orm::DbErr> {
    list_item::Entity::update_many()
        .col_expr(list_item::Column::Rank, Expr::val(-1).sub(Expr::col(list_item::Column::Rank)))
        .filter(list_item::Column::ListId.eq(list_id))
        .filter(list_item::Column::Rank.gte(from))
        .exec(conn)
        .await?;
    list_item::Entity::update_many()
        .col_expr(list_item::Column::Rank, Expr::val(0).sub(Expr::col(list_item::Column::Rank)))
        .filter(list_item::Column::ListId.eq(list_id))
        .filter(list_item::Column::Rank.lt(0))
        .exec(conn)
        .await?;
    Ok(())
}

async fn set_rank<C: ConnectionTrait>(conn: &C, item_id: &str, rank: i32) -> Result<(), sea_orm::DbErr> {
    list_item::Entity::update_many()
        .col_expr(list_item::Column::Rank, Expr::value(rank))
        .filter(list_item::Column::Id.eq(item_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn touch_list<C: ConnectionTrait>(conn: &C, list_id: &str, now: i64) -> Result<(), sea_orm::DbErr> {
    list::Entity::update_many()
        .col_expr(list::Column::UpdatedAt, Expr::value(now))
        .filter(list::Column::Id.eq(list_id))
        .exec(conn)
        .await?;
    Ok(())
}
