mod auth;
mod catalog;
mod diary;
mod forms;
mod health;
mod lists;
mod pages;
mod reviews;
mod titles;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, header},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::AppState;

const HSTS: &str = "max-age=31536000; includeSubDomains";

fn security_headers() -> [(HeaderName, &'static str); 4] {
    [
        (header::X_FRAME_OPTIONS, "DENY"),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
        (HeaderName::from_static("permissions-policy"), "camera=(), microphone=(), geolocation=()"),
    ]
}

pub fn router(state: Arc<AppState>) -> Router {
    let production = state.config.production;

    let api = Router::new()
        .route("/catalog/search", get(catalog::search))
        .route("/catalog/hydrate", post(catalog::hydrate))
        .route("/titles", get(titles::list))
        .route("/titles/{tmdb_id}", get(titles::show))
        .route("/reviews", get(reviews::list).post(reviews::create))
        .route("/reviews/{id}", get(reviews::show).delete(reviews::delete))
        .route("/diary", get(diary::list))
        .route("/diary/log", post(diary::log))
        .route("/diary/stats", get(diary::stats))
        .route("/lists", get(lists::index).post(lists::create))
        .route("/lists/{list_id}", get(lists::show).put(lists::update).delete(lists::delete))
        .route(
            "/lists/{list_id}/items",
            get(lists::items)
                .post(lists::add_item)
                .put(lists::update_items)
                .delete(lists::remove_item),
        )
        .route("/health/db", get(health::db))
        .route("/health/catalog", get(health::catalog))
        .route("/health/db-stats", get(health::db_stats))
        .route("/auth/sign-in", get(auth::sign_in_redirect).post(auth::sign_in))
        .route("/auth/sign-up", get(auth::sign_up_redirect).post(auth::sign_up))
        .route("/auth/session", get(auth::session))
        .route("/admin/unlock", post(auth::admin_unlock));

    let mut app = Router::new()
        .route("/", get(pages::home))
        .route("/search", get(pages::search))
        .route("/titles/{tmdb_id}", get(pages::title))
        .route("/reviews", get(pages::reviews))
        .route("/reviews/{id}", get(pages::review))
        .route("/review/{tmdb_id}", get(pages::review_form).post(forms::create_review_form))
        .route("/track", get(pages::track).post(forms::log_diary_form))
        .route("/to-watch", get(pages::to_watch).post(forms::add_to_watch_later_form))
        .route("/my-reviews", get(pages::my_reviews))
        .route("/my-reviews/delete", post(forms::delete_reviews_form))
        .route("/lists", get(pages::lists).post(forms::create_list_form))
        .route("/lists/{list_id}", get(pages::list))
        .route("/lists/{list_id}/edit", get(pages::list_edit).post(forms::update_list_form))
        .route("/lists/{list_id}/delete", post(forms::delete_list_form))
        .route("/lists/{list_id}/items", post(forms::add_item_form))
        .route("/lists/{list_id}/items/order", post(forms::reorder_items_form))
        .route("/lists/{list_id}/items/{item_id}/note", post(forms::item_note_form))
        .route("/lists/{list_id}/items/{item_id}/delete", post(forms::remove_item_form))
        .route("/me", get(pages::me))
        .route("/sign-in", get(pages::sign_in))
        .route("/sign-up", get(pages::sign_up))
        .route("/sign-out", get(auth::sign_out))
        .route("/admin/unlock", get(pages::admin_unlock))
        .nest("/api", api)
        .with_state(state);

    for (name, value) in security_headers() {
        app = app.layer(SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value)));
    }
    if production {
        app = app.layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS),
        ));
    }

    app.layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

/// `{ "ok": true, "data": ... }`
fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "ok": true, "data": data }))
}

/// `{ "ok": true }`
fn ok_empty() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Only same-site absolute paths are honoured as redirect targets.
fn next_path(raw: Option<&str>, fallback: &str) -> String {
    match raw {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => fallback.to_string(),
    }
}
