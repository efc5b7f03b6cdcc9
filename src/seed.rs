//! Example data for a fresh database. Safe to run repeatedly.

use jiff::civil::date;

use crate::{
    error::AppResult,
    models::{CatalogSource, HydratedTitle, MediaType},
    store::{NewDiaryEntry, Store},
};

pub async fn run(store: &Store) -> AppResult<()> {
    let title = store
        .upsert_title(&HydratedTitle {
            tmdb_id: 1,
            media_type: MediaType::Movie,
            source: CatalogSource::Tmdb,
            title: "Example Film".to_string(),
            original_title: Some("Example Film".to_string()),
            overview: Some("Seeded example title.".to_string()),
            poster_path: None,
            backdrop_path: None,
            runtime_minutes: Some(120),
            genres: vec!["Drama".to_string()],
            release_date: Some("2020-01-01".to_string()),
            vote_average: None,
        })
        .await?;

    let watched_on = date(2024, 1, 1);
    if store.diary_entry_exists(&title.id, watched_on).await? {
        tracing::info!(title_id = %title.id, "seed diary entry already present");
        return Ok(());
    }

    store
        .log_diary_entry(NewDiaryEntry {
            title_id: title.id.clone(),
            watched_on,
            rating: Some(3.75),
            liked: true,
            rewatch: false,
            notes: Some("Seeded diary entry.".to_string()),
        })
        .await?;
    tracing::info!(title_id = %title.id, "seeded example title and diary entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing;

    #[tokio::test]
    async fn seeding_twice_keeps_one_entry() {
        let store = testing::store().await;
        run(&store).await.unwrap();
        run(&store).await.unwrap();

        let entries = store.recent_diary_entries(10, None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].watched_on, "2024-01-01");
        assert_eq!(entries[0].rating, Some(3.75));
        assert!(entries[0].liked);

        let title = store.find_title(1, MediaType::Movie).await.unwrap().unwrap();
        assert_eq!(title.title, "Example Film");
        assert_eq!(title.runtime_minutes, Some(120));
    }
}
