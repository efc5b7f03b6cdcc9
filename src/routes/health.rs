use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::Value;

use super::{ok, ok_empty};
use crate::{AppState, error::AppResult, session::CurrentUser};

pub async fn db(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    state.store.ping().await.inspect_err(|err| tracing::error!(error = %err, "db health check failed"))?;
    Ok(ok_empty())
}

pub async fn catalog(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    state
        .catalog
        .ping()
        .await
        .inspect_err(|err| tracing::warn!(error = %err, "catalog health check failed"))?;
    Ok(ok_empty())
}

pub async fn db_stats(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Value>> {
    Ok(ok(state.store.db_stats(&user.id).await?))
}
