use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::{forms::find_watch_later, next_path, titles};
use crate::{
    AppState, dates,
    error::{AppError, AppResult, PageError},
    extract::PageQuery,
    models::{CatalogResult, CatalogSource, ListView, MediaType, SearchType, SessionUser, TitleView},
    session::MaybeUser,
    store::ReviewFilter,
    templates::{self, Banner, CatalogSearch, Pick},
};

const PAGE_REVIEW_LIMIT: u64 = 50;

fn render(result: AppResult<Response>) -> Response {
    result.unwrap_or_else(|err| PageError(err).into_response())
}

fn html(body: String) -> AppResult<Response> {
    Ok(Html(body).into_response())
}

fn sign_in_first(path: &str) -> AppResult<Response> {
    let to = format!("/sign-in?next={}", urlencoding::encode(path));
    Ok(Redirect::to(&to).into_response())
}

pub async fn home(State(state): State<Arc<AppState>>, MaybeUser(user): MaybeUser) -> Response {
    render(
        async {
            let today = dates::today();
            let range = dates::month_range(today.year(), today.month());
            let entries = state.store.recent_diary_entries(12, range).await?;
            let stats = state.store.diary_stats(Some(today.year()), Some(today.month())).await?;
            let label = today.strftime("%B %Y").to_string();
            html(templates::home_page(user.as_ref(), &label, &entries, &stats))
        }
        .await,
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    q: String,
    #[serde(rename = "type")]
    kind: SearchType,
}

/// Catalog hits for a page; upstream failures become an inline message.
async fn catalog_results(state: &AppState, q: &str, kind: SearchType) -> (Vec<CatalogResult>, Option<String>) {
    if q.chars().count() < 2 {
        return (Vec::new(), None);
    }
    match state.catalog.search(q, kind, 1).await {
        Ok(found) => (found.results, None),
        Err(err) => {
            tracing::warn!(error = %err, query = q, "page search upstream error");
            (Vec::new(), Some(err.to_string()))
        },
    }
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    PageQuery(params): PageQuery<SearchParams>,
) -> Response {
    let q = params.q.trim();
    let (results, error) = catalog_results(&state, q, params.kind).await;
    Html(templates::search_page(user.as_ref(), q, params.kind, &results, error.as_deref())).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleParams {
    #[serde(default = "titles::default_media_type")]
    media_type: MediaType,
}

pub async fn title(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(tmdb_id): Path<String>,
    PageQuery(params): PageQuery<TitleParams>,
) -> Response {
    render(
        async {
            let tmdb_id = titles::parse_tmdb_id(&tmdb_id)?;
            let media_type = params.media_type;
            let view: TitleView = titles::find_view(&state, tmdb_id, media_type).await?;
            let reviews = match state.store.find_title(tmdb_id, media_type).await? {
                Some(local) => {
                    state
                        .store
                        .recent_reviews(ReviewFilter {
                            limit: PAGE_REVIEW_LIMIT,
                            user_id: None,
                            title_id: Some(local.id),
                        })
                        .await?
                },
                None => Vec::new(),
            };
            html(templates::title_page(user.as_ref(), &view, &reviews))
        }
        .await,
    )
}

pub async fn reviews(State(state): State<Arc<AppState>>, MaybeUser(user): MaybeUser) -> Response {
    render(
        async {
            let reviews = state
                .store
                .recent_reviews(ReviewFilter { limit: PAGE_REVIEW_LIMIT, ..Default::default() })
                .await?;
            html(templates::reviews_page(user.as_ref(), "Recent reviews", &reviews))
        }
        .await,
    )
}

pub async fn review(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Response {
    render(
        async {
            let review = state
                .store
                .find_review(&id)
                .await?
                .ok_or_else(|| AppError::not_found("Review not found."))?;
            html(templates::review_page(user.as_ref(), &review))
        }
        .await,
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BannerParams {
    notice: Option<String>,
    error: Option<String>,
}

impl BannerParams {
    fn banner(&self) -> Banner<'_> {
        Banner { notice: self.notice.as_deref(), error: self.error.as_deref() }
    }
}

pub async fn lists(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    PageQuery(params): PageQuery<BannerParams>,
) -> Response {
    render(
        async {
            let Some(user) = user else {
                return sign_in_first("/lists");
            };
            let lists: Vec<ListView> =
                state.store.lists_for_user(&user.id).await?.into_iter().map(ListView::from).collect();
            html(templates::lists_page(&user, &lists, params.banner()))
        }
        .await,
    )
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(list_id): Path<String>,
) -> Response {
    render(
        async {
            let Some(user) = user else {
                return sign_in_first(&format!("/lists/{list_id}"));
            };
            let list = owned_page_list(&state, &user, &list_id).await?;
            let items = state.store.list_items(&list.id, &user.id).await?;
            html(templates::list_page(&user, &ListView::from(list), &items))
        }
        .await,
    )
}

pub async fn me(State(state): State<Arc<AppState>>, MaybeUser(user): MaybeUser) -> Response {
    render(
        async {
            let Some(user) = user else {
                return sign_in_first("/me");
            };
            let stats = state.store.db_stats(&user.id).await?;
            let reviews = state
                .store
                .recent_reviews(ReviewFilter { limit: 10, user_id: Some(user.id.clone()), title_id: None })
                .await?;
            html(templates::me_page(&user, &stats, &reviews))
        }
        .await,
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewFormParams {
    media_type: MediaType,
    source: CatalogSource,
    error: Option<String>,
}

pub async fn review_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(raw_id): Path<String>,
    PageQuery(params): PageQuery<ReviewFormParams>,
) -> Response {
    render(
        async {
            let Some(user) = user else {
                let back = format!(
                    "/review/{raw_id}?mediaType={}&source={}",
                    params.media_type,
                    params.source.as_str()
                );
                return sign_in_first(&back);
            };
            let tmdb_id = titles::parse_tmdb_id(&raw_id)?;
            let title = match params.source {
                CatalogSource::Tmdb => match titles::find_view(&state, tmdb_id, params.media_type).await {
                    Ok(view) => Some(view),
                    Err(AppError::NotFound(_)) => None,
                    Err(err) => return Err(err),
                },
                CatalogSource::Tvmaze => state
                    .store
                    .find_title(tmdb_id, params.media_type)
                    .await?
                    .filter(|t| t.source == CatalogSource::Tvmaze)
                    .map(TitleView::from),
            };
            let pick = Pick {
                source: params.source,
                external_id: i64::from(tmdb_id),
                media_type: params.media_type,
                title: format!("{} #{tmdb_id}", if params.source == CatalogSource::Tmdb { "TMDB" } else { "TVmaze" }),
            };
            let today = dates::today().to_string();
            html(templates::review_form_page(&user, &pick, title.as_ref(), &today, params.error.as_deref()))
        }
        .await,
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackParams {
    q: String,
    #[serde(rename = "type")]
    kind: SearchType,
    source: CatalogSource,
    external_id: Option<i64>,
    media_type: MediaType,
    title: Option<String>,
    notice: Option<String>,
    error: Option<String>,
}

pub async fn track(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    PageQuery(params): PageQuery<TrackParams>,
) -> Response {
    let Some(user) = user else {
        return render(sign_in_first("/track"));
    };
    let q = params.q.trim();
    let (results, error) = catalog_results(&state, q, params.kind).await;
    let pick = params.external_id.filter(|id| *id > 0).map(|external_id| Pick {
        source: params.source,
        external_id,
        media_type: params.media_type,
        title: params.title.clone().unwrap_or_else(|| format!("#{external_id}")),
    });
    let search = CatalogSearch { query: q, kind: params.kind, results: &results, error: error.as_deref() };
    let banner = Banner { notice: params.notice.as_deref(), error: params.error.as_deref() };
    let today = dates::today().to_string();
    Html(templates::track_page(&user, search, pick.as_ref(), &today, banner)).into_response()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PickerParams {
    q: String,
    #[serde(rename = "type")]
    kind: SearchType,
    notice: Option<String>,
    error: Option<String>,
}

impl PickerParams {
    fn banner(&self) -> Banner<'_> {
        Banner { notice: self.notice.as_deref(), error: self.error.as_deref() }
    }
}

pub async fn list_edit(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(list_id): Path<String>,
    PageQuery(params): PageQuery<PickerParams>,
) -> Response {
    render(
        async {
            let Some(user) = user else {
                return sign_in_first(&format!("/lists/{list_id}/edit"));
            };
            let list = owned_page_list(&state, &user, &list_id).await?;
            let items = state.store.list_items(&list.id, &user.id).await?;
            let q = params.q.trim();
            let (results, error) = catalog_results(&state, q, params.kind).await;
            let search = CatalogSearch { query: q, kind: params.kind, results: &results, error: error.as_deref() };
            html(templates::list_edit_page(&user, &ListView::from(list), &items, search, params.banner()))
        }
        .await,
    )
}

pub async fn to_watch(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    PageQuery(params): PageQuery<PickerParams>,
) -> Response {
    render(
        async {
            let Some(user) = user else {
                return sign_in_first("/to-watch");
            };
            let list = find_watch_later(&state, &user.id).await?;
            let items = match &list {
                Some(list) => state.store.list_items(&list.id, &user.id).await?,
                None => Vec::new(),
            };
            let q = params.q.trim();
            let (results, error) = catalog_results(&state, q, params.kind).await;
            let search = CatalogSearch { query: q, kind: params.kind, results: &results, error: error.as_deref() };
            let list = list.map(ListView::from);
            html(templates::to_watch_page(&user, list.as_ref(), &items, search, params.banner()))
        }
        .await,
    )
}

pub async fn my_reviews(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    PageQuery(params): PageQuery<BannerParams>,
) -> Response {
    render(
        async {
            let Some(user) = user else {
                return sign_in_first("/my-reviews");
            };
            let reviews = state
                .store
                .recent_reviews(ReviewFilter {
                    limit: PAGE_REVIEW_LIMIT,
                    user_id: Some(user.id.clone()),
                    title_id: None,
                })
                .await?;
            html(templates::my_reviews_page(&user, &reviews, params.banner()))
        }
        .await,
    )
}

async fn owned_page_list(
    state: &AppState,
    user: &SessionUser,
    list_id: &str,
) -> AppResult<crate::entities::list::Model> {
    if uuid::Uuid::parse_str(list_id).is_err() {
        return Err(AppError::not_found("List not found."));
    }
    state.store.owned_list(list_id, &user.id).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthParams {
    error: Option<String>,
    next: Option<String>,
}

pub async fn sign_in(PageQuery(params): PageQuery<AuthParams>) -> Html<String> {
    let next = next_path(params.next.as_deref(), "/me");
    Html(templates::sign_in_page(params.error.as_deref(), &next))
}

pub async fn sign_up(PageQuery(params): PageQuery<AuthParams>) -> Html<String> {
    let next = next_path(params.next.as_deref(), "/me");
    Html(templates::sign_up_page(params.error.as_deref(), &next))
}

pub async fn admin_unlock(PageQuery(params): PageQuery<AuthParams>) -> Html<String> {
    let next = next_path(params.next.as_deref(), "/reviews");
    Html(templates::unlock_page(params.error.is_some(), &next))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{models::MediaType, routes::testing::*, store::testing::hydrated};

    #[tokio::test]
    async fn public_pages_render() {
        let app = TestApp::new("http://127.0.0.1:9").await;
        app.state.store.upsert_title(&hydrated(7, MediaType::Movie, "Se7en")).await.unwrap();

        for uri in ["/", "/search", "/search?q=x", "/reviews", "/titles/7", "/sign-in", "/sign-up", "/admin/unlock?error=1"] {
            let resp = app.send(get(uri)).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        }

        let html = body_text(app.send(get("/titles/7?mediaType=movie")).await).await;
        assert!(html.contains("Se7en"));
    }

    #[tokio::test]
    async fn private_pages_redirect_anonymous_users() {
        let app = TestApp::new("http://127.0.0.1:9").await;
        let resp = app.send(get("/lists")).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/sign-in?next=%2Flists");

        let cookie = app.sign_in("page@x.test").await;
        let resp = app.send(with_cookie(get("/me"), &cookie)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("page@x.test"));
    }

    #[tokio::test]
    async fn missing_review_renders_error_page() {
        let app = TestApp::new("http://127.0.0.1:9").await;
        let resp = app.send(get("/reviews/nope")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_text(resp).await.contains("Review not found."));
    }

    #[tokio::test]
    async fn bad_page_queries_render_html() {
        let app = TestApp::new("http://127.0.0.1:9").await;
        for uri in ["/search?type=person", "/titles/7?mediaType=book"] {
            let resp = app.send(get(uri)).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert!(resp.headers()["content-type"].to_str().unwrap().starts_with("text/html"));
            let html = body_text(resp).await;
            assert!(html.contains("Failed to deserialize query string"), "{uri}");
        }
    }
}
