use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{LikeExpr, OnConflict},
};

use super::{Store, new_id};
use crate::{
    dates::now_sec,
    entities::title,
    error::{AppError, AppResult},
    models::{HydratedTitle, MediaType},
};

const TITLE_LIST_LIMIT: u64 = 50;

impl Store {
    /// Inserts or refreshes the title keyed by `(tmdb_id, media_type)` and returns the stored row.
    pub async fn upsert_title(&self, hydrated: &HydratedTitle) -> AppResult<title::Model> {
        let now = now_sec();
        let genres = serde_json::to_string(&hydrated.genres).map_err(anyhow::Error::from)?;
        let row = title::ActiveModel {
            id: Set(new_id()),
            tmdb_id: Set(hydrated.tmdb_id),
            media_type: Set(hydrated.media_type),
            source: Set(hydrated.source),
            title: Set(hydrated.title.clone()),
            original_title: Set(hydrated.original_title.clone()),
            overview: Set(hydrated.overview.clone()),
            poster_path: Set(hydrated.poster_path.clone()),
            backdrop_path: Set(hydrated.backdrop_path.clone()),
            runtime_minutes: Set(hydrated.runtime_minutes),
            genres: Set(genres),
            release_date: Set(hydrated.release_date.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        title::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([title::Column::TmdbId, title::Column::MediaType])
                    .update_columns([
                        title::Column::Source,
                        title::Column::Title,
                        title::Column::OriginalTitle,
                        title::Column::Overview,
                        title::Column::PosterPath,
                        title::Column::BackdropPath,
                        title::Column::RuntimeMinutes,
                        title::Column::Genres,
                        title::Column::ReleaseDate,
                        title::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        self.find_title(hydrated.tmdb_id, hydrated.media_type)
            .await?
            .ok_or_else(|| anyhow::anyhow!("title {} missing after upsert", hydrated.tmdb_id).into())
    }

    pub async fn find_title(
        &self,
        tmdb_id: i32,
        media_type: MediaType,
    ) -> AppResult<Option<title::Model>> {
        let found = title::Entity::find()
            .filter(title::Column::TmdbId.eq(tmdb_id))
            .filter(title::Column::MediaType.eq(media_type))
            .one(&self.db)
            .await?;
        Ok(found)
    }

    /// Like [`Store::find_title`] but a miss is a 404 telling the caller to hydrate first.
    pub async fn require_title(
        &self,
        tmdb_id: i32,
        media_type: MediaType,
        action: &str,
    ) -> AppResult<title::Model> {
        self.find_title(tmdb_id, media_type).await?.ok_or_else(|| {
            AppError::not_found(format!("Title not found. Hydrate the title before {action}."))
        })
    }

    /// Newest titles first, optionally filtered by a case-insensitive substring of the name.
    pub async fn search_titles(&self, query: Option<&str>) -> AppResult<Vec<title::Model>> {
        let mut select = title::Entity::find();
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            select = select.filter(title::Column::Title.like(substring_pattern(q)));
        }
        let titles = select
            .order_by_desc(title::Column::CreatedAt)
            .order_by_desc(super::insertion_order(title::Entity))
            .limit(TITLE_LIST_LIMIT)
            .all(&self.db)
            .await?;
        Ok(titles)
    }
}

/// `LIKE` pattern matching `q` anywhere, with `%` and `_` taken literally.
fn substring_pattern(q: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::CatalogSource, store::testing};

    #[tokio::test]
    async fn upsert_updates_in_place() {
        let store = testing::store().await;
        let first = store.upsert_title(&testing::hydrated(603, MediaType::Movie, "Matrix")).await.unwrap();

        let mut again = testing::hydrated(603, MediaType::Movie, "The Matrix");
        again.genres = vec!["Action".into(), "Science Fiction".into()];
        let second = store.upsert_title(&again).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "The Matrix");
        assert_eq!(second.genre_names(), ["Action", "Science Fiction"]);
        assert_eq!(store.search_titles(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_id_differs_by_media_type() {
        let store = testing::store().await;
        store.upsert_title(&testing::hydrated(1, MediaType::Movie, "Film")).await.unwrap();
        let mut show = testing::hydrated(1, MediaType::Tv, "Show");
        show.source = CatalogSource::Tvmaze;
        store.upsert_title(&show).await.unwrap();

        let tv = store.find_title(1, MediaType::Tv).await.unwrap().unwrap();
        assert_eq!(tv.title, "Show");
        assert_eq!(tv.source, CatalogSource::Tvmaze);
        assert!(store.find_title(2, MediaType::Movie).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_filters_case_insensitively() {
        let store = testing::store().await;
        testing::title(&store, 1, "Alien").await;
        testing::title(&store, 2, "Aliens").await;
        testing::title(&store, 3, "Heat").await;

        let hits = store.search_titles(Some(" ALIEN ")).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(store.search_titles(Some("")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let store = testing::store().await;
        testing::title(&store, 1, "100% Wolf").await;
        testing::title(&store, 2, "1000 Wolves").await;
        testing::title(&store, 3, "Snake_Eyes").await;
        testing::title(&store, 4, "Snake Eyes").await;
        testing::title(&store, 5, r"Back\Slash").await;

        let names = |hits: Vec<title::Model>| hits.into_iter().map(|t| t.title).collect::<Vec<_>>();
        assert_eq!(names(store.search_titles(Some("0%")).await.unwrap()), ["100% Wolf"]);
        assert_eq!(names(store.search_titles(Some("e_e")).await.unwrap()), ["Snake_Eyes"]);
        assert_eq!(names(store.search_titles(Some(r"k\s")).await.unwrap()), [r"Back\Slash"]);
        assert!(store.search_titles(Some("%")).await.unwrap().iter().all(|t| t.title.contains('%')));
    }

    #[tokio::test]
    async fn require_title_reports_missing_title() {
        let store = testing::store().await;
        let err = store.require_title(9, MediaType::Movie, "creating a review").await.unwrap_err();
        assert_eq!(err.to_string(), "Title not found. Hydrate the title before creating a review.");
    }
}
