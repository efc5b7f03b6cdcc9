use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::Value;

use super::{ok, reviews::rating_in_range};
use crate::{
    AppState,
    admin::RequireAdmin,
    dates,
    error::{AppError, AppResult, Validation},
    extract::{ApiJson, ApiQuery},
    models::{DiaryEntryView, MediaType},
    store::NewDiaryEntry,
};

const DEFAULT_LIMIT: u64 = 12;
const MAX_LIMIT: u64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub tmdb_id: i64,
    pub media_type: MediaType,
    pub watched_on: String,
    pub rating: Option<f64>,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub rewatch: bool,
    pub notes: Option<String>,
}

pub async fn log(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    ApiJson(req): ApiJson<LogEntry>,
) -> AppResult<Json<Value>> {
    Ok(ok(log_entry(&state, req).await?))
}

pub(super) async fn log_entry(state: &AppState, req: LogEntry) -> AppResult<DiaryEntryView> {
    let tmdb_id = i32::try_from(req.tmdb_id).ok().filter(|id| *id > 0);
    Validation::new()
        .check(tmdb_id.is_some(), "tmdbId", "tmdbId must be a positive integer.")
        .check(rating_in_range(req.rating), "rating", "rating must be between 0 and 5.")
        .body()?;
    let tmdb_id = tmdb_id.unwrap_or_default();

    let watched_on = dates::parse_date(&req.watched_on)
        .ok_or_else(|| AppError::bad_request("watchedOn must be a valid date."))?;

    let title = state.store.require_title(tmdb_id, req.media_type, "logging a diary entry").await?;
    let entry = state
        .store
        .log_diary_entry(NewDiaryEntry {
            title_id: title.id.clone(),
            watched_on,
            rating: req.rating,
            liked: req.liked,
            rewatch: req.rewatch,
            notes: req.notes,
        })
        .await?;
    Ok(DiaryEntryView::new(entry, Some(&title)))
}

fn check_period(v: &mut Validation, month: Option<i8>, year: Option<i16>) {
    v.check(month.is_none_or(|m| (1..=12).contains(&m)), "month", "month must be between 1 and 12.")
        .check(
            year.is_none_or(|y| (1970..=2100).contains(&y)),
            "year",
            "year must be between 1970 and 2100.",
        );
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<u64>,
    month: Option<i8>,
    year: Option<i16>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    month: Option<i8>,
    year: Option<i16>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let mut v = Validation::new();
    v.check((1..=MAX_LIMIT).contains(&limit), "limit", "limit must be between 1 and 50.");
    check_period(&mut v, query.month, query.year);
    v.query()?;

    let range = query
        .year
        .zip(query.month)
        .and_then(|(year, month)| dates::month_range(year, month));
    let entries = state.store.recent_diary_entries(limit, range).await?;
    Ok(ok(entries))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> AppResult<Json<Value>> {
    let mut v = Validation::new();
    check_period(&mut v, query.month, query.year);
    v.query()?;

    let stats = state.store.diary_stats(query.year, query.month).await?;
    Ok(ok(stats))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{models::MediaType, routes::testing::*, store::testing::hydrated};

    async fn app_with_title() -> TestApp {
        let app = TestApp::new("http://127.0.0.1:9").await;
        app.state.store.upsert_title(&hydrated(27205, MediaType::Movie, "Inception")).await.unwrap();
        app
    }

    async fn log(app: &TestApp, watched_on: &str, rating: Option<f64>) -> StatusCode {
        let body = json!({ "tmdbId": 27205, "mediaType": "movie", "watchedOn": watched_on, "rating": rating });
        app.send(as_admin(json("POST", "/api/diary/log", body))).await.status()
    }

    #[tokio::test]
    async fn log_requires_admin_valid_date_and_known_title() {
        let app = app_with_title().await;
        let body = json!({ "tmdbId": 27205, "mediaType": "movie", "watchedOn": "2024-01-01" });
        let resp = app.send(json("POST", "/api/diary/log", body)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(log(&app, "not-a-date", None).await, StatusCode::BAD_REQUEST);

        let unknown = json!({ "tmdbId": 1, "mediaType": "tv", "watchedOn": "2024-01-01" });
        let resp = app.send(as_admin(json("POST", "/api/diary/log", unknown))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(resp).await["error"]["message"],
            "Title not found. Hydrate the title before logging a diary entry."
        );

        assert_eq!(log(&app, "2024-01-01T12:00:00Z", Some(4.0)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn lists_and_summarizes_entries() {
        let app = app_with_title().await;
        for (day, rating) in [("2024-03-02", Some(5.0)), ("2024-03-20", Some(3.0)), ("2024-04-01", None)] {
            assert_eq!(log(&app, day, rating).await, StatusCode::OK);
        }

        let march = body_json(app.send(get("/api/diary?month=3&year=2024")).await).await;
        let entries = march["data"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["watchedOn"], "2024-03-20");
        assert_eq!(entries[0]["title"]["title"], "Inception");

        let month_only = body_json(app.send(get("/api/diary?month=3")).await).await;
        assert_eq!(month_only["data"].as_array().unwrap().len(), 3);

        let stats = body_json(app.send(get("/api/diary/stats?month=3&year=2024")).await).await;
        assert_eq!(stats["data"], json!({ "total": 3, "yearCount": 3, "monthCount": 2, "avgRating": 4.0 }));

        let resp = app.send(get("/api/diary?limit=0")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = app.send(get("/api/diary/stats?month=13")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
