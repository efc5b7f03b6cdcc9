use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::Value;

use super::{ok, ok_empty, titles::default_media_type};
use crate::{
    AppState,
    admin::RequireAdmin,
    dates,
    error::{AppError, AppResult, Validation},
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{MediaType, ReviewView},
    session::MaybeUser,
    store::{NewReview, ReviewFilter},
};

const DEFAULT_LIMIT: u64 = 12;
const MAX_LIMIT: u64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    pub tmdb_id: i64,
    pub media_type: MediaType,
    pub watched_on: Option<String>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub contains_spoilers: bool,
    #[serde(default)]
    pub liked: bool,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    MaybeUser(user): MaybeUser,
    ApiJson(req): ApiJson<CreateReview>,
) -> AppResult<Json<Value>> {
    let view = create_review(&state, user.map(|u| u.id), req).await?;
    Ok(ok(view))
}

/// Validates and stores a review against an already hydrated title.
pub(super) async fn create_review(
    state: &AppState,
    user_id: Option<String>,
    req: CreateReview,
) -> AppResult<ReviewView> {
    let tmdb_id = i32::try_from(req.tmdb_id).ok().filter(|id| *id > 0);
    Validation::new()
        .check(tmdb_id.is_some(), "tmdbId", "tmdbId must be a positive integer.")
        .check(rating_in_range(req.rating), "rating", "rating must be between 0 and 5.")
        .check(!req.body.is_empty(), "body", "body is required.")
        .check(req.tags.iter().all(|t| !t.is_empty()), "tags", "tags cannot be empty.")
        .body()?;
    let tmdb_id = tmdb_id.unwrap_or_default();

    let watched_on = match req.watched_on.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            dates::parse_date(raw)
                .ok_or_else(|| AppError::bad_request("watchedOn must be a valid date."))?
                .to_string(),
        ),
        None => None,
    };

    let title = state.store.require_title(tmdb_id, req.media_type, "creating a review").await?;
    let review = state
        .store
        .create_review(NewReview {
            title_id: title.id,
            user_id,
            watched_on,
            rating: req.rating,
            contains_spoilers: req.contains_spoilers,
            liked: req.liked,
            body: req.body,
            tags: req.tags,
        })
        .await?;

    let view = state
        .store
        .find_review(&review.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("review {} missing after insert", review.id))?;
    Ok(view)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    limit: Option<u64>,
    #[serde(default)]
    mine: bool,
    tmdb_id: Option<i32>,
    #[serde(default = "default_media_type")]
    media_type: MediaType,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    Validation::new()
        .check((1..=MAX_LIMIT).contains(&limit), "limit", "limit must be between 1 and 50.")
        .query()?;

    let user_id = match (query.mine, user) {
        (false, _) => None,
        (true, Some(user)) => Some(user.id),
        (true, None) => return Err(AppError::Unauthorized),
    };

    let title_id = match query.tmdb_id {
        Some(tmdb_id) => match state.store.find_title(tmdb_id, query.media_type).await? {
            Some(title) => Some(title.id),
            None => return Ok(ok(Vec::<Value>::new())),
        },
        None => None,
    };

    let reviews = state.store.recent_reviews(ReviewFilter { limit, user_id, title_id }).await?;
    Ok(ok(reviews))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Value>> {
    let review = state
        .store
        .find_review(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Review not found."))?;
    Ok(ok(review))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Value>> {
    if !state.store.delete_review(&id).await? {
        return Err(AppError::not_found("Review not found."));
    }
    tracing::info!(review_id = %id, "deleted review");
    Ok(ok_empty())
}

pub(super) fn rating_in_range(rating: Option<f64>) -> bool {
    rating.is_none_or(|r| (0.0..=5.0).contains(&r))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{models::MediaType, routes::testing::*, store::testing::hydrated};

    async fn app_with_title() -> TestApp {
        let app = TestApp::new("http://127.0.0.1:9").await;
        app.state.store.upsert_title(&hydrated(550, MediaType::Movie, "Fight Club")).await.unwrap();
        app
    }

    fn review_body() -> serde_json::Value {
        json!({
            "tmdbId": 550,
            "mediaType": "movie",
            "watchedOn": "2024-02-03",
            "rating": 4.5,
            "body": "First rule.",
            "tags": [" Cult ", "cult", "Twist"]
        })
    }

    #[test]
    fn ratings_are_bounded() {
        assert!(super::rating_in_range(None));
        assert!(super::rating_in_range(Some(0.0)));
        assert!(super::rating_in_range(Some(5.0)));
        assert!(!super::rating_in_range(Some(5.5)));
        assert!(!super::rating_in_range(Some(-1.0)));
    }

    #[tokio::test]
    async fn create_requires_admin() {
        let app = app_with_title().await;
        let resp = app.send(json("POST", "/api/reviews", review_body())).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"]["code"], "ADMIN_REQUIRED");
    }

    #[tokio::test]
    async fn create_then_fetch_review() {
        let app = app_with_title().await;
        let cookie = app.sign_in("critic@x.test").await;

        let resp = app
            .send(with_cookie(as_admin(json("POST", "/api/reviews", review_body())), &cookie))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let created = body_json(resp).await["data"].clone();
        assert_eq!(created["tags"], json!(["cult", "twist"]));
        assert_eq!(created["watchedOn"], "2024-02-03");

        let id = created["id"].as_str().unwrap();
        let fetched = body_json(app.send(get(&format!("/api/reviews/{id}"))).await).await;
        assert_eq!(fetched["data"]["title"]["title"], "Fight Club");
        assert_eq!(fetched["data"]["rating"], 4.5);

        let mine = body_json(app.send(with_cookie(get("/api/reviews?mine=true"), &cookie)).await).await;
        assert_eq!(mine["data"].as_array().unwrap().len(), 1);

        let by_title = body_json(app.send(get("/api/reviews?tmdbId=550&mediaType=movie")).await).await;
        assert_eq!(by_title["data"].as_array().unwrap().len(), 1);

        let other_title = body_json(app.send(get("/api/reviews?tmdbId=1")).await).await;
        assert!(other_title["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_validates_input() {
        let app = app_with_title().await;

        let mut bad_rating = review_body();
        bad_rating["rating"] = json!(7);
        let resp = app.send(as_admin(json("POST", "/api/reviews", bad_rating))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["message"], "Invalid request body.");
        assert!(body["error"]["details"]["rating"].is_array());

        let mut bad_date = review_body();
        bad_date["watchedOn"] = json!("someday");
        let resp = app.send(as_admin(json("POST", "/api/reviews", bad_date))).await;
        assert_eq!(body_json(resp).await["error"]["message"], "watchedOn must be a valid date.");

        let mut unknown = review_body();
        unknown["tmdbId"] = json!(1);
        let resp = app.send(as_admin(json("POST", "/api/reviews", unknown))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .send(as_admin(json("POST", "/api/reviews", json!({ "tmdbId": "x" }))))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mine_requires_session_and_delete_removes() {
        let app = app_with_title().await;
        let resp = app.send(get("/api/reviews?mine=true")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let created = body_json(app.send(as_admin(json("POST", "/api/reviews", review_body()))).await).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let denied = app.send(json("DELETE", &format!("/api/reviews/{id}"), json!(null))).await;
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let deleted = app.send(as_admin(json("DELETE", &format!("/api/reviews/{id}"), json!(null)))).await;
        assert_eq!(deleted.status(), StatusCode::OK);

        let gone = app.send(get(&format!("/api/reviews/{id}"))).await;
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(gone).await["error"]["message"], "Review not found.");
    }
}
