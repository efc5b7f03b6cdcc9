use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::Value;

use super::ok;
use crate::{
    AppState,
    catalog::CatalogError,
    error::{AppError, AppResult},
    extract::{ApiPath, ApiQuery},
    models::{CatalogSource, MediaType, TitleView},
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    q: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<Value>> {
    let titles = state.store.search_titles(query.q.as_deref()).await?;
    Ok(ok(titles.into_iter().map(TitleView::from).collect::<Vec<_>>()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowQuery {
    #[serde(default = "default_media_type")]
    pub media_type: MediaType,
}

pub(super) fn default_media_type() -> MediaType {
    MediaType::Movie
}

pub(super) fn parse_tmdb_id(raw: &str) -> AppResult<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request("Invalid tmdbId."))
}

/// Local title when hydrated, otherwise a read-only TMDB lookup.
pub(super) async fn find_view(
    state: &AppState,
    tmdb_id: i32,
    media_type: MediaType,
) -> AppResult<TitleView> {
    if let Some(title) = state.store.find_title(tmdb_id, media_type).await? {
        return Ok(TitleView::from(title));
    }

    match state.catalog.fetch_title(CatalogSource::Tmdb, i64::from(tmdb_id), media_type).await {
        Ok(remote) => Ok(TitleView::from_remote(remote)),
        Err(CatalogError::Status { status: 404, .. }) => Err(AppError::not_found("Title not found.")),
        Err(err) => {
            tracing::warn!(tmdb_id, error = %err, "remote title lookup failed");
            Err(AppError::not_found("Title not found."))
        },
    }
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    ApiPath(tmdb_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<ShowQuery>,
) -> AppResult<Json<Value>> {
    let tmdb_id = parse_tmdb_id(&tmdb_id)?;
    Ok(ok(find_view(&state, tmdb_id, query.media_type).await?))
}
