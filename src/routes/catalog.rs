use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use serde::Deserialize;
use serde_json::{Value, json};

use super::ok;
use crate::{
    AppState,
    entities::title,
    error::{AppError, AppResult, Validation},
    extract::{ApiJson, ApiQuery},
    models::{CatalogSource, MediaType, SearchType, TitleView},
    rate_limit::client_key,
    session::CurrentUser,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
    #[serde(rename = "type", default)]
    kind: SearchType,
    #[serde(default = "first_page")]
    page: i64,
}

fn first_page() -> i64 {
    1
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<Json<Value>> {
    let client = client_key(&headers);
    if state.search_limiter.is_limited(&client) {
        tracing::debug!(client = %client, "search rate limited");
        return Err(AppError::RateLimited);
    }

    let q = query.q.as_str();
    Validation::new()
        .check(q.chars().count() >= 2, "q", "q must be at least 2 characters.")
        .check(query.page >= 1 && query.page <= i64::from(u32::MAX), "page", "page must be a positive integer.")
        .query()?;

    let page = u32::try_from(query.page).unwrap_or(1);
    let result = state.catalog.search(q, query.kind, page).await?;
    Ok(ok(json!({ "results": result.results })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrateBody {
    pub source: CatalogSource,
    pub external_id: i64,
    pub media_type: MediaType,
}

pub async fn hydrate(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<HydrateBody>,
) -> AppResult<Json<Value>> {
    let title = hydrate_title(&state, &user.id, body).await?;
    Ok(ok(TitleView::from(title)))
}

/// Fetches the title upstream and upserts it locally.
pub(super) async fn hydrate_title(
    state: &AppState,
    user_id: &str,
    body: HydrateBody,
) -> AppResult<title::Model> {
    Validation::new()
        .check(
            body.external_id > 0 && body.external_id <= i64::from(i32::MAX),
            "externalId",
            "externalId must be a positive integer.",
        )
        .check(
            body.source != CatalogSource::Tvmaze || body.media_type == MediaType::Tv,
            "mediaType",
            "TVmaze only supports tv mediaType.",
        )
        .body()?;

    let hydrated = state.catalog.fetch_title(body.source, body.external_id, body.media_type).await?;
    let title = state.store.upsert_title(&hydrated).await?;
    tracing::info!(
        user_id = %user_id,
        tmdb_id = title.tmdb_id,
        media_type = %title.media_type,
        "hydrated title"
    );
    Ok(title)
}
