//! Persistence over sea-orm. Every operation the routes need goes through [`Store`].

mod diary;
mod lists;
mod reviews;
mod titles;
mod users;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Statement,
    sea_query::{Alias, Expr, SimpleExpr},
};

pub use diary::NewDiaryEntry;
pub use lists::{ListChanges, MAX_RANK, NewListItem};
pub use reviews::{NewReview, ReviewFilter};

use crate::{
    entities::{list, review, title},
    error::AppResult,
    models::DbStats,
};

#[derive(Clone)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.db
            .execute(Statement::from_string(self.db.get_database_backend(), "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Catalog-wide title count plus the user's own reviews and lists.
    pub async fn db_stats(&self, user_id: &str) -> AppResult<DbStats> {
        let (titles, reviews, lists) = futures::try_join!(
            title::Entity::find().count(&self.db),
            review::Entity::find().filter(review::Column::UserId.eq(user_id)).count(&self.db),
            list::Entity::find().filter(list::Column::UserId.eq(user_id)).count(&self.db),
        )?;
        Ok(DbStats { titles, reviews, lists })
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// SQLite rowid of `entity`, used to order rows written within the same second.
fn insertion_order<E: EntityTrait>(entity: E) -> SimpleExpr {
    Expr::col((entity, Alias::new("rowid"))).into()
}

/// Trims optional free text; blank becomes `None`.
fn clean_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_drops_blank() {
        assert_eq!(clean_text(Some("  hi ")), Some("hi".to_string()));
        assert_eq!(clean_text(Some("   ")), None);
        assert_eq!(clean_text(None), None);
    }

    #[tokio::test]
    async fn stats_scope_reviews_and_lists_to_user() {
        let store = testing::store().await;
        store.ping().await.unwrap();
        let alice = testing::user(&store, "alice@example.test").await;
        let bob = store.create_user("bob@example.test", "1:00:00", "bob", None).await.unwrap().id;
        let t = testing::title(&store, 1, "One").await;

        store
            .create_review(NewReview {
                title_id: t.id.clone(),
                user_id: Some(alice.clone()),
                watched_on: None,
                rating: Some(4.0),
                contains_spoilers: false,
                liked: true,
                body: "Good".into(),
                tags: vec![],
            })
            .await
            .unwrap();
        store.create_list(&bob, "Bob's", None, Default::default()).await.unwrap();

        let stats = store.db_stats(&alice).await.unwrap();
        assert_eq!(stats, DbStats { titles: 1, reviews: 1, lists: 0 });
    }
}
