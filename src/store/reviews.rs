use std::collections::{HashMap, HashSet};

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait, sea_query::OnConflict,
};

use super::{Store, new_id};
use crate::{
    dates::now_sec,
    entities::{review, review_tag, tag, title},
    error::AppResult,
    models::ReviewView,
};

#[derive(Clone, Debug)]
pub struct NewReview {
    pub title_id: String,
    pub user_id: Option<String>,
    pub watched_on: Option<String>,
    pub rating: Option<f64>,
    pub contains_spoilers: bool,
    pub liked: bool,
    pub body: String,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ReviewFilter {
    pub limit: u64,
    pub user_id: Option<String>,
    pub title_id: Option<String>,
}

/// Trimmed, lower-cased and de-duplicated in first-seen order; blanks are dropped.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

impl Store {
    /// Writes the review and its tag links in one transaction.
    pub async fn create_review(&self, new: NewReview) -> AppResult<review::Model> {
        let now = now_sec();
        let tags = normalize_tags(&new.tags);
        let created = review::Model {
            id: new_id(),
            title_id: new.title_id,
            user_id: new.user_id,
            watched_on: new.watched_on,
            rating: new.rating,
            contains_spoilers: new.contains_spoilers,
            liked: new.liked,
            body: new.body,
            created_at: now,
            updated_at: now,
        };

        let txn = self.db.begin().await?;

        review::Entity::insert(review::ActiveModel {
            id: Set(created.id.clone()),
            title_id: Set(created.title_id.clone()),
            user_id: Set(created.user_id.clone()),
            watched_on: Set(created.watched_on.clone()),
            rating: Set(created.rating),
            contains_spoilers: Set(created.contains_spoilers),
            liked: Set(created.liked),
            body: Set(created.body.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .exec_without_returning(&txn)
        .await?;

        if !tags.is_empty() {
            let tag_ids = ensure_tags(&txn, &tags).await?;
            let links = tag_ids.into_iter().map(|tag_id| review_tag::ActiveModel {
                review_id: Set(created.id.clone()),
                tag_id: Set(tag_id),
            });
            review_tag::Entity::insert_many(links).exec_without_returning(&txn).await?;
        }

        txn.commit().await?;
        tracing::debug!(review_id = %created.id, tags = tags.len(), "created review");
        Ok(created)
    }

    pub async fn find_review(&self, id: &str) -> AppResult<Option<ReviewView>> {
        let Some((review, Some(title))) = review::Entity::find_by_id(id.to_string())
            .find_also_related(title::Entity)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let mut tags = self.tags_for(&[review.id.clone()]).await?;
        let names = tags.remove(&review.id).unwrap_or_default();
        Ok(Some(ReviewView::new(review, &title, names)))
    }

    /// Newest first, with title summary and tag names.
    pub async fn recent_reviews(&self, filter: ReviewFilter) -> AppResult<Vec<ReviewView>> {
        let mut select = review::Entity::find().find_also_related(title::Entity);
        if let Some(user_id) = &filter.user_id {
            select = select.filter(review::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(title_id) = &filter.title_id {
            select = select.filter(review::Column::TitleId.eq(title_id.as_str()));
        }
        let rows = select
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(super::insertion_order(review::Entity))
            .limit(filter.limit)
            .all(&self.db)
            .await?;

        let ids: Vec<String> = rows.iter().map(|(r, _)| r.id.clone()).collect();
        let mut tags = self.tags_for(&ids).await?;

        let views = rows
            .into_iter()
            .filter_map(|(review, title)| {
                let title = title?;
                let names = tags.remove(&review.id).unwrap_or_default();
                Some(ReviewView::new(review, &title, names))
            })
            .collect();
        Ok(views)
    }

    /// Returns `false` when there was no such review.
    pub async fn delete_review(&self, id: &str) -> AppResult<bool> {
        let txn = self.db.begin().await?;
        review_tag::Entity::delete_many()
            .filter(review_tag::Column::ReviewId.eq(id))
            .exec(&txn)
            .await?;
        let deleted = review::Entity::delete_by_id(id.to_string()).exec(&txn).await?;
        txn.commit().await?;
        Ok(deleted.rows_affected > 0)
    }

    /// Deletes those of `ids` written by `user_id` and returns how many went.
    pub async fn delete_reviews_by_author(&self, user_id: &str, ids: &[String]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let txn = self.db.begin().await?;
        let owned: Vec<String> = review::Entity::find()
            .select_only()
            .column(review::Column::Id)
            .filter(review::Column::UserId.eq(user_id))
            .filter(review::Column::Id.is_in(ids.iter().cloned()))
            .into_tuple()
            .all(&txn)
            .await?;
        if owned.is_empty() {
            return Ok(0);
        }

        review_tag::Entity::delete_many()
            .filter(review_tag::Column::ReviewId.is_in(owned.iter().cloned()))
            .exec(&txn)
            .await?;
        let deleted = review::Entity::delete_many()
            .filter(review::Column::Id.is_in(owned))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(deleted.rows_affected)
    }

    async fn tags_for(&self, review_ids: &[String]) -> AppResult<HashMap<String, Vec<String>>> {
        if review_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let links = review_tag::Entity::find()
            .filter(review_tag::Column::ReviewId.is_in(review_ids.iter().cloned()))
            .find_also_related(tag::Entity)
            .order_by_asc(tag::Column::Name)
            .all(&self.db)
            .await?;

        let mut by_review: HashMap<String, Vec<String>> = HashMap::new();
        for (link, tag) in links {
            if let Some(tag) = tag {
                by_review.entry(link.review_id).or_default().push(tag.name);
            }
        }
        Ok(by_review)
    }
}

/// Creates any missing tags and returns the ids for all of `names`.
async fn ensure_tags<C: ConnectionTrait>(conn: &C, names: &[String]) -> AppResult<Vec<i32>> {
    let rows = names.iter().map(|name| tag::ActiveModel {
        id: Default::default(),
        name: Set(name.clone()),
    });
    tag::Entity::insert_many(rows)
        .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

    let ids = tag::Entity::find()
        .select_only()
        .column(tag::Column::Id)
        .filter(tag::Column::Name.is_in(names.iter().cloned()))
        .into_tuple::<i32>()
        .all(conn)
        .await?;
    Ok(ids)
}
