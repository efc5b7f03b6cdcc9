//! Form posts behind the authoring pages. Every handler answers with a 303: on to the
//! result, or back to the page with an `error` or `notice` banner.

use std::{str::FromStr, sync::Arc};

use axum::{extract::State, response::Redirect};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::{
    catalog::{HydrateBody, hydrate_title},
    diary::{LogEntry, log_entry},
    lists::{
        AddItem, CreateList, RankChange, UpdateList, add_to_list, check_note, check_reorder,
        create_list, owned, reorder, update_list,
    },
    reviews::{CreateReview, create_review},
};
use crate::{
    AppState, admin,
    entities::{list, title},
    error::{AppError, AppResult},
    extract::{ApiPath, PageForm},
    models::{CatalogSource, MediaType, Privacy, SessionUser},
    session::MaybeUser,
};

pub const WATCH_LATER: &str = "Watch Later";

/// Turns a handler outcome into the redirect the browser follows.
fn finish(result: AppResult<String>, back_to: &str) -> Redirect {
    match result {
        Ok(to) => Redirect::to(&to),
        Err(AppError::Unauthorized) => {
            Redirect::to(&format!("/sign-in?next={}", urlencoding::encode(back_to)))
        },
        Err(AppError::AdminRequired) => {
            Redirect::to(&format!("/admin/unlock?next={}", urlencoding::encode(back_to)))
        },
        Err(err) => {
            match &err {
                AppError::Database(_) | AppError::Internal(_) => {
                    tracing::error!(error = %err, path = back_to, "form post failed")
                },
                AppError::Upstream(inner) => tracing::warn!(error = %inner, "form upstream error"),
                _ => tracing::debug!(error = %err, path = back_to, "form rejected"),
            }
            Redirect::to(&with_banner(back_to, "error", &err.user_message()))
        },
    }
}

pub(super) fn with_banner(path: &str, key: &str, message: &str) -> String {
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{key}={}", urlencoding::encode(message))
}

fn signed_in(user: Option<SessionUser>) -> AppResult<SessionUser> {
    user.ok_or(AppError::Unauthorized)
}

fn require_admin(state: &AppState, jar: &CookieJar) -> AppResult<()> {
    let cookie = jar.get(admin::ADMIN_COOKIE_NAME).map(|c| c.value());
    if admin::is_admin(&state.config, None, cookie) {
        Ok(())
    } else {
        Err(AppError::AdminRequired)
    }
}

/// Empty means absent; anything else must parse.
fn optional<T: FromStr>(raw: &str, field: &str, message: &str) -> AppResult<Option<T>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| AppError::invalid_field(field, message))
}

fn non_blank(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

/// The local title for a catalog pick, hydrating it first when it is not stored yet.
async fn ensure_title(
    state: &AppState,
    user_id: &str,
    source: CatalogSource,
    external_id: i64,
    media_type: MediaType,
) -> AppResult<title::Model> {
    if let Ok(id) = i32::try_from(external_id) {
        if let Some(found) = state.store.find_title(id, media_type).await? {
            if found.source == source {
                return Ok(found);
            }
        }
    }
    hydrate_title(state, user_id, HydrateBody { source, external_id, media_type }).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewForm {
    source: CatalogSource,
    media_type: MediaType,
    watched_on: String,
    rating: String,
    liked: Option<String>,
    contains_spoilers: Option<String>,
    body: String,
    tags: String,
}

pub async fn create_review_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    ApiPath(tmdb_id): ApiPath<String>,
    PageForm(form): PageForm<ReviewForm>,
) -> Redirect {
    let back_to = format!(
        "/review/{}?mediaType={}&source={}",
        urlencoding::encode(&tmdb_id),
        form.media_type,
        form.source.as_str()
    );
    let result: AppResult<String> = async {
        let user = signed_in(user)?;
        require_admin(&state, &jar)?;
        let external_id = super::titles::parse_tmdb_id(&tmdb_id)?;
        let rating = optional(&form.rating, "rating", "rating must be between 0 and 5.")?;
        if form.body.trim().is_empty() {
            return Err(AppError::invalid_field("body", "Review text is required."));
        }

        let title =
            ensure_title(&state, &user.id, form.source, i64::from(external_id), form.media_type).await?;
        let review = create_review(
            &state,
            Some(user.id),
            CreateReview {
                tmdb_id: i64::from(title.tmdb_id),
                media_type: title.media_type,
                watched_on: non_blank(&form.watched_on),
                rating,
                contains_spoilers: form.contains_spoilers.is_some(),
                liked: form.liked.is_some(),
                body: form.body.trim().to_string(),
                tags: form.tags.split(',').map(str::to_string).collect(),
            },
        )
        .await?;
        Ok(format!("/reviews/{}", review.id))
    }
    .await;
    finish(result, &back_to)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackForm {
    source: CatalogSource,
    external_id: i64,
    media_type: MediaType,
    watched_on: String,
    rating: String,
    liked: Option<String>,
    rewatch: Option<String>,
    notes: String,
}

pub async fn log_diary_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    PageForm(form): PageForm<TrackForm>,
) -> Redirect {
    let result: AppResult<String> = async {
        let user = signed_in(user)?;
        require_admin(&state, &jar)?;
        let rating = optional(&form.rating, "rating", "rating must be between 0 and 5.")?;

        let title = ensure_title(&state, &user.id, form.source, form.external_id, form.media_type).await?;
        log_entry(
            &state,
            LogEntry {
                tmdb_id: i64::from(title.tmdb_id),
                media_type: title.media_type,
                watched_on: form.watched_on,
                rating,
                liked: form.liked.is_some(),
                rewatch: form.rewatch.is_some(),
                notes: non_blank(&form.notes),
            },
        )
        .await?;
        Ok(with_banner("/track", "notice", "Film logged."))
    }
    .await;
    finish(result, "/track")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListForm {
    name: String,
    description: String,
    privacy: Privacy,
}

pub async fn create_list_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    PageForm(form): PageForm<ListForm>,
) -> Redirect {
    let result: AppResult<String> = async {
        let user = signed_in(user)?;
        let list = create_list(
            &state,
            &user.id,
            CreateList {
                name: form.name.trim().to_string(),
                description: non_blank(&form.description),
                privacy: form.privacy,
            },
        )
        .await?;
        Ok(format!("/lists/{}/edit", list.id))
    }
    .await;
    finish(result, "/lists")
}

fn edit_path(list_id: &str) -> String {
    format!("/lists/{}/edit", urlencoding::encode(list_id))
}

async fn owned_by(state: &AppState, user: Option<SessionUser>, list_id: &str) -> AppResult<(SessionUser, list::Model)> {
    let user = signed_in(user)?;
    let list = owned(state, list_id, &user.id).await?;
    Ok((user, list))
}

pub async fn update_list_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ApiPath(list_id): ApiPath<String>,
    PageForm(form): PageForm<ListForm>,
) -> Redirect {
    let back_to = edit_path(&list_id);
    let result: AppResult<String> = async {
        let (_, list) = owned_by(&state, user, &list_id).await?;
        update_list(
            &state,
            list,
            UpdateList {
                name: Some(form.name.trim().to_string()),
                description: Some(form.description),
                privacy: Some(form.privacy),
            },
        )
        .await?;
        Ok(with_banner(&back_to, "notice", "List saved."))
    }
    .await;
    finish(result, &back_to)
}

pub async fn delete_list_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ApiPath(list_id): ApiPath<String>,
) -> Redirect {
    let back_to = edit_path(&list_id);
    let result: AppResult<String> = async {
        let (user, list) = owned_by(&state, user, &list_id).await?;
        state.store.delete_list(&list.id).await?;
        tracing::debug!(list_id = %list.id, user_id = %user.id, "deleted list");
        Ok("/lists".to_string())
    }
    .await;
    finish(result, &back_to)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PickForm {
    source: CatalogSource,
    external_id: i64,
    media_type: MediaType,
    rank: String,
}

pub async fn add_item_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ApiPath(list_id): ApiPath<String>,
    PageForm(form): PageForm<PickForm>,
) -> Redirect {
    let back_to = edit_path(&list_id);
    let result: AppResult<String> = async {
        let (user, list) = owned_by(&state, user, &list_id).await?;
        let rank = optional(&form.rank, "rank", "rank must be between 1 and 10000.")?;
        let title = ensure_title(&state, &user.id, form.source, form.external_id, form.media_type).await?;
        add_to_list(
            &state,
            &list,
            AddItem { tmdb_id: i64::from(title.tmdb_id), media_type: title.media_type, rank, note: None },
        )
        .await?;
        Ok(with_banner(&back_to, "notice", "Added to list."))
    }
    .await;
    finish(result, &back_to)
}

/// Orders items by the ranks typed in, an item that moved going ahead of one already
/// holding that rank, then numbers them from 1.
fn ranks_from_form(fields: &[(String, String)], current: &[(String, i32)]) -> AppResult<Vec<RankChange>> {
    let mut wanted = Vec::new();
    for (key, value) in fields {
        let Some(id) = key.strip_prefix("rank:") else { continue };
        let rank = value
            .trim()
            .parse::<i32>()
            .map_err(|_| AppError::invalid_field("items", "rank must be between 1 and 10000."))?;
        wanted.push(RankChange { id: id.to_string(), rank });
    }
    check_reorder(&wanted)?;

    let held = |id: &str| current.iter().find(|(item, _)| item == id).map(|(_, rank)| *rank);
    wanted.sort_by_key(|change| {
        let was = held(&change.id);
        (change.rank, was == Some(change.rank), was.unwrap_or(i32::MAX))
    });
    Ok(wanted
        .into_iter()
        .zip(1..)
        .map(|(change, rank)| RankChange { id: change.id, rank })
        .collect())
}

pub async fn reorder_items_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ApiPath(list_id): ApiPath<String>,
    PageForm(fields): PageForm<Vec<(String, String)>>,
) -> Redirect {
    let back_to = edit_path(&list_id);
    let result: AppResult<String> = async {
        let (user, list) = owned_by(&state, user, &list_id).await?;
        let current: Vec<(String, i32)> = state
            .store
            .list_items(&list.id, &user.id)
            .await?
            .into_iter()
            .map(|item| (item.id, item.rank))
            .collect();
        let changes = ranks_from_form(&fields, &current)?;
        reorder(&state, &list, changes).await?;
        Ok(with_banner(&back_to, "notice", "Order saved."))
    }
    .await;
    finish(result, &back_to)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NoteForm {
    note: String,
}

pub async fn item_note_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ApiPath((list_id, item_id)): ApiPath<(String, String)>,
    PageForm(form): PageForm<NoteForm>,
) -> Redirect {
    let back_to = edit_path(&list_id);
    let result: AppResult<String> = async {
        let note = non_blank(&form.note);
        check_note(&item_id, note.as_deref())?;
        let (_, list) = owned_by(&state, user, &list_id).await?;
        state.store.update_list_item_note(&list.id, &item_id, note.as_deref()).await?;
        Ok(with_banner(&back_to, "notice", "Note saved."))
    }
    .await;
    finish(result, &back_to)
}

pub async fn remove_item_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    ApiPath((list_id, item_id)): ApiPath<(String, String)>,
) -> Redirect {
    let back_to = edit_path(&list_id);
    let result: AppResult<String> = async {
        let (_, list) = owned_by(&state, user, &list_id).await?;
        state.store.remove_list_item(&list.id, &item_id).await?;
        Ok(with_banner(&back_to, "notice", "Removed from list."))
    }
    .await;
    finish(result, &back_to)
}

/// The user's "Watch Later" list, matched by trimmed name regardless of case.
pub(super) async fn find_watch_later(state: &AppState, user_id: &str) -> AppResult<Option<list::Model>> {
    let lists = state.store.lists_for_user(user_id).await?;
    Ok(lists.into_iter().find(|l| l.name.trim().eq_ignore_ascii_case(WATCH_LATER)))
}

pub async fn add_to_watch_later_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    PageForm(form): PageForm<PickForm>,
) -> Redirect {
    let result: AppResult<String> = async {
        let user = signed_in(user)?;
        let list = match find_watch_later(&state, &user.id).await? {
            Some(list) => list,
            None => {
                state
                    .store
                    .create_list(&user.id, WATCH_LATER, Some("Titles to watch later."), Privacy::Private)
                    .await?
            },
        };

        let items = state.store.list_items(&list.id, &user.id).await?;
        let already = items.iter().any(|item| {
            i64::from(item.title.tmdb_id) == form.external_id && item.title.media_type == form.media_type
        });
        if already {
            return Ok(with_banner("/to-watch", "notice", "Already in Watch Later."));
        }

        let title = ensure_title(&state, &user.id, form.source, form.external_id, form.media_type).await?;
        add_to_list(
            &state,
            &list,
            AddItem { tmdb_id: i64::from(title.tmdb_id), media_type: title.media_type, rank: None, note: None },
        )
        .await?;
        Ok(with_banner("/to-watch", "notice", "Added to Watch Later."))
    }
    .await;
    finish(result, "/to-watch")
}

pub async fn delete_reviews_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    PageForm(fields): PageForm<Vec<(String, String)>>,
) -> Redirect {
    let result: AppResult<String> = async {
        let user = signed_in(user)?;
        require_admin(&state, &jar)?;
        let ids: Vec<String> = fields
            .into_iter()
            .filter(|(key, value)| key == "id" && !value.is_empty())
            .map(|(_, value)| value)
            .collect();
        if ids.is_empty() {
            return Err(AppError::invalid_field("id", "Select reviews to delete."));
        }

        let deleted = state.store.delete_reviews_by_author(&user.id, &ids).await?;
        tracing::info!(user_id = %user.id, deleted, "bulk deleted reviews");
        let noun = if deleted == 1 { "review" } else { "reviews" };
        Ok(with_banner("/my-reviews", "notice", &format!("Deleted {deleted} {noun}.")))
    }
    .await;
    finish(result, "/my-reviews")
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;
    use crate::{
        routes::testing::{TestApp, body_text, form, get, location, with_cookie},
        store::{NewReview, testing::hydrated},
    };

    const OFFLINE: &str = "http://127.0.0.1:9";

    async fn user_id(app: &TestApp, email: &str) -> String {
        app.state.store.find_user_by_email(email).await.unwrap().unwrap().id
    }

    fn with_admin(cookie: &str) -> String {
        format!("{cookie}; {}=letmein", admin::ADMIN_COOKIE_NAME)
    }

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn ids(changes: &[RankChange]) -> Vec<(&str, i32)> {
        changes.iter().map(|c| (c.id.as_str(), c.rank)).collect()
    }

    #[test]
    fn moved_item_goes_ahead_of_the_current_holder() {
        let current = [("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 3)];
        let form = fields(&[("rank:a", "1"), ("rank:b", "2"), ("rank:c", "1")]);
        let changes = ranks_from_form(&form, &current).unwrap();
        assert_eq!(ids(&changes), [("c", 1), ("a", 2), ("b", 3)]);
    }

    #[test]
    fn gaps_are_closed_and_other_fields_ignored() {
        let current = [("a".to_string(), 5), ("b".to_string(), 9)];
        let form = fields(&[("rank:b", "2"), ("note", "x"), ("rank:a", "7")]);
        let changes = ranks_from_form(&form, &current).unwrap();
        assert_eq!(ids(&changes), [("b", 1), ("a", 2)]);
    }

    #[test]
    fn bad_ranks_are_rejected() {
        let current = [("a".to_string(), 1)];
        for raw in ["", "x", "0", "10001"] {
            let form = fields(&[("rank:a", raw)]);
            assert!(matches!(ranks_from_form(&form, &current), Err(AppError::BadRequest { .. })), "{raw:?}");
        }
    }

    #[test]
    fn banners_append_to_existing_queries() {
        assert_eq!(with_banner("/track", "notice", "Film logged."), "/track?notice=Film%20logged.");
        assert_eq!(
            with_banner("/review/1?mediaType=movie", "error", "a&b"),
            "/review/1?mediaType=movie&error=a%26b"
        );
    }

    #[test]
    fn blank_optional_numbers_are_absent() {
        assert_eq!(optional::<f64>(" ", "rating", "bad").unwrap(), None);
        assert_eq!(optional::<f64>("3.5", "rating", "bad").unwrap(), Some(3.5));
        assert!(optional::<f64>("lots", "rating", "bad").is_err());
    }

    #[tokio::test]
    async fn review_form_hydrates_then_saves() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 603, "title": "The Matrix", "release_date": "1999-03-31"
            })))
            .mount(&server)
            .await;
        let app = TestApp::new(&server.uri()).await;
        let cookie = app.sign_in("critic@x.test").await;

        let resp = app.send(with_cookie(get("/review/603?mediaType=movie"), &cookie)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("The Matrix"));
        assert!(html.contains(r#"action="/review/603""#));

        let body = "source=tmdb&mediaType=movie&watchedOn=2024-05-01&rating=4.5&liked=on&body=Still+holds+up.&tags=Sci-Fi%2C+classic%2C";
        let resp = app.send(with_cookie(form("/review/603", body), &with_admin(&cookie))).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let review_id = location(&resp).strip_prefix("/reviews/").unwrap().to_string();

        let review = app.state.store.find_review(&review_id).await.unwrap().unwrap();
        assert_eq!(review.title.title, "The Matrix");
        assert_eq!(review.rating, Some(4.5));
        assert!(review.liked);
        assert!(!review.contains_spoilers);
        assert_eq!(review.tags, ["sci-fi", "classic"]);
        assert!(app.state.store.find_title(603, MediaType::Movie).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn review_form_needs_session_admin_and_text() {
        let app = TestApp::new(OFFLINE).await;
        app.state.store.upsert_title(&hydrated(5, MediaType::Movie, "Heat")).await.unwrap();
        let body = "source=tmdb&mediaType=movie&body=Great";

        let resp = app.send(form("/review/5", body)).await;
        assert_eq!(
            location(&resp),
            "/sign-in?next=%2Freview%2F5%3FmediaType%3Dmovie%26source%3Dtmdb"
        );

        let cookie = app.sign_in("r@x.test").await;
        let resp = app.send(with_cookie(form("/review/5", body), &cookie)).await;
        assert_eq!(
            location(&resp),
            "/admin/unlock?next=%2Freview%2F5%3FmediaType%3Dmovie%26source%3Dtmdb"
        );

        let resp = app
            .send(with_cookie(form("/review/5", "source=tmdb&mediaType=movie&body=+"), &with_admin(&cookie)))
            .await;
        assert_eq!(
            location(&resp),
            "/review/5?mediaType=movie&source=tmdb&error=Review%20text%20is%20required."
        );

        let resp = app
            .send(with_cookie(form("/review/5", "mediaType=movie&body=Ok&rating=9"), &with_admin(&cookie)))
            .await;
        assert!(location(&resp).ends_with("error=rating%20must%20be%20between%200%20and%205."));

        let resp = app
            .send(with_cookie(form("/review/5", "mediaType=book&body=Ok"), &with_admin(&cookie)))
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(resp).await.contains("Failed to deserialize form"));
    }

    #[tokio::test]
    async fn track_logs_a_diary_entry() {
        let app = TestApp::new(OFFLINE).await;
        app.state.store.upsert_title(&hydrated(5, MediaType::Movie, "Heat")).await.unwrap();
        let cookie = app.sign_in("t@x.test").await;

        let resp = app
            .send(with_cookie(get("/track?source=tmdb&externalId=5&mediaType=movie&title=Heat"), &cookie))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("Heat"));
        assert!(html.contains(r#"name="externalId" value="5""#));

        let body = "source=tmdb&externalId=5&mediaType=movie&watchedOn=2024-02-03&rating=&liked=on&notes=+";
        let resp = app.send(with_cookie(form("/track", body), &with_admin(&cookie))).await;
        assert_eq!(location(&resp), "/track?notice=Film%20logged.");

        let entries = app.state.store.recent_diary_entries(10, None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].watched_on, "2024-02-03");
        assert!(entries[0].liked);
        assert!(!entries[0].rewatch);
        assert_eq!(entries[0].rating, None);
        assert_eq!(entries[0].notes, None);

        let resp = app
            .send(with_cookie(form("/track", "externalId=5&mediaType=movie&watchedOn=someday"), &with_admin(&cookie)))
            .await;
        assert_eq!(location(&resp), "/track?error=watchedOn%20must%20be%20a%20valid%20date.");
    }

    #[tokio::test]
    async fn list_authoring_round() {
        let app = TestApp::new(OFFLINE).await;
        for (id, name) in [(1, "Alien"), (2, "Heat"), (3, "Ronin")] {
            app.state.store.upsert_title(&hydrated(id, MediaType::Movie, name)).await.unwrap();
        }
        let cookie = app.sign_in("author@x.test").await;
        let owner = user_id(&app, "author@x.test").await;

        let resp = app.send(with_cookie(form("/lists", "name=+"), &cookie)).await;
        assert_eq!(location(&resp), "/lists?error=name%20is%20required.");

        let resp = app
            .send(with_cookie(form("/lists", "name=Top+Three&description=&privacy=private"), &cookie))
            .await;
        let edit = location(&resp).to_string();
        let list_id = edit.strip_prefix("/lists/").unwrap().strip_suffix("/edit").unwrap().to_string();

        for id in 1..=3 {
            let body = format!("source=tmdb&externalId={id}&mediaType=movie");
            let resp = app.send(with_cookie(form(&format!("/lists/{list_id}/items"), &body), &cookie)).await;
            assert_eq!(location(&resp), format!("{edit}?notice=Added%20to%20list."));
        }
        let resp = app
            .send(with_cookie(
                form(&format!("/lists/{list_id}/items"), "externalId=1&mediaType=movie&rank=10001"),
                &cookie,
            ))
            .await;
        assert!(location(&resp).contains("error=rank%20must%20be%20between%201%20and%2010000."));

        let order = |items: Vec<crate::models::ListItemView>| {
            items.into_iter().map(|i| (i.title.title, i.rank)).collect::<Vec<_>>()
        };
        let items = app.state.store.list_items(&list_id, &owner).await.unwrap();
        let (alien, heat, ronin) = (items[0].id.clone(), items[1].id.clone(), items[2].id.clone());

        let body = format!("rank%3A{alien}=1&rank%3A{heat}=2&rank%3A{ronin}=1");
        let resp = app.send(with_cookie(form(&format!("/lists/{list_id}/items/order"), &body), &cookie)).await;
        assert_eq!(location(&resp), format!("{edit}?notice=Order%20saved."));
        assert_eq!(
            order(app.state.store.list_items(&list_id, &owner).await.unwrap()),
            [("Ronin".to_string(), 1), ("Alien".to_string(), 2), ("Heat".to_string(), 3)]
        );

        let note_path = format!("/lists/{list_id}/items/{alien}/note");
        app.send(with_cookie(form(&note_path, "note=Start+here"), &cookie)).await;
        let long = format!("note={}", "x".repeat(501));
        let resp = app.send(with_cookie(form(&note_path, &long), &cookie)).await;
        assert!(location(&resp).contains("error=note%20must%20be%20at%20most%20500%20characters."));

        let resp = app
            .send(with_cookie(form(&format!("/lists/{list_id}/items/{heat}/delete"), ""), &cookie))
            .await;
        assert_eq!(location(&resp), format!("{edit}?notice=Removed%20from%20list."));
        let items = app.state.store.list_items(&list_id, &owner).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].note.as_deref(), Some("Start here"));

        let resp = app
            .send(with_cookie(form(&edit, "name=Best&description=Ever&privacy=public"), &cookie))
            .await;
        assert_eq!(location(&resp), format!("{edit}?notice=List%20saved."));
        let html = body_text(app.send(with_cookie(get(&edit), &cookie)).await).await;
        assert!(html.contains("Best"));
        assert!(html.contains("Save order"));
        assert!(html.contains(&format!(r#"name="rank:{alien}""#)));

        let stranger = app.sign_in("other@x.test").await;
        let resp = app.send(with_cookie(form(&format!("/lists/{list_id}/delete"), ""), &stranger)).await;
        assert_eq!(location(&resp), format!("{edit}?error=Not%20allowed."));

        let resp = app.send(with_cookie(form(&format!("/lists/{list_id}/delete"), ""), &cookie)).await;
        assert_eq!(location(&resp), "/lists");
        assert!(app.state.store.lists_for_user(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn watch_later_is_created_once_and_skips_duplicates() {
        let app = TestApp::new(OFFLINE).await;
        app.state.store.upsert_title(&hydrated(7, MediaType::Movie, "Se7en")).await.unwrap();
        let cookie = app.sign_in("w@x.test").await;
        let owner = user_id(&app, "w@x.test").await;

        let resp = app.send(with_cookie(get("/to-watch"), &cookie)).await;
        assert!(body_text(resp).await.contains("not created yet"));

        let pick = "source=tmdb&externalId=7&mediaType=movie";
        let resp = app.send(with_cookie(form("/to-watch", pick), &cookie)).await;
        assert_eq!(location(&resp), "/to-watch?notice=Added%20to%20Watch%20Later.");
        let resp = app.send(with_cookie(form("/to-watch", pick), &cookie)).await;
        assert_eq!(location(&resp), "/to-watch?notice=Already%20in%20Watch%20Later.");

        let lists = app.state.store.lists_for_user(&owner).await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, WATCH_LATER);
        assert_eq!(lists[0].privacy, Privacy::Private);
        assert_eq!(app.state.store.list_items(&lists[0].id, &owner).await.unwrap().len(), 1);

        let html = body_text(app.send(with_cookie(get("/to-watch"), &cookie)).await).await;
        assert!(html.contains("Se7en"));
    }

    #[tokio::test]
    async fn bulk_delete_removes_selected_own_reviews() {
        let app = TestApp::new(OFFLINE).await;
        let title = app.state.store.upsert_title(&hydrated(9, MediaType::Movie, "Thief")).await.unwrap();
        let cookie = app.sign_in("me@x.test").await;
        let me = user_id(&app, "me@x.test").await;
        app.sign_in("them@x.test").await;
        let them = user_id(&app, "them@x.test").await;

        let review = |user_id: &str| NewReview {
            title_id: title.id.clone(),
            user_id: Some(user_id.to_string()),
            watched_on: None,
            rating: None,
            contains_spoilers: false,
            liked: false,
            body: "Cool.".into(),
            tags: Vec::new(),
        };
        let mine = app.state.store.create_review(review(&me)).await.unwrap();
        let kept = app.state.store.create_review(review(&me)).await.unwrap();
        let theirs = app.state.store.create_review(review(&them)).await.unwrap();

        let html = body_text(app.send(with_cookie(get("/my-reviews"), &cookie)).await).await;
        assert!(html.contains(&format!(r#"value="{}""#, mine.id)));
        assert!(!html.contains(&format!(r#"value="{}""#, theirs.id)));

        let body = format!("id={}&id={}", mine.id, theirs.id);
        let resp = app.send(with_cookie(form("/my-reviews/delete", &body), &cookie)).await;
        assert_eq!(location(&resp), "/admin/unlock?next=%2Fmy-reviews");

        let resp = app.send(with_cookie(form("/my-reviews/delete", ""), &with_admin(&cookie))).await;
        assert_eq!(location(&resp), "/my-reviews?error=Select%20reviews%20to%20delete.");

        let resp = app.send(with_cookie(form("/my-reviews/delete", &body), &with_admin(&cookie))).await;
        assert_eq!(location(&resp), "/my-reviews?notice=Deleted%201%20review.");
        assert!(app.state.store.find_review(&mine.id).await.unwrap().is_none());
        assert!(app.state.store.find_review(&kept.id).await.unwrap().is_some());
        assert!(app.state.store.find_review(&theirs.id).await.unwrap().is_some());
    }
}
