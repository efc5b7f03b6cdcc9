use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::Value;

use super::{ok, ok_empty};
use crate::{
    AppState,
    entities::{list, list_item},
    error::{AppError, AppResult, Validation},
    extract::{ApiJson, ApiPath},
    models::{ListItemRecord, ListView, MediaType, Privacy},
    session::CurrentUser,
    store::{ListChanges, MAX_RANK, NewListItem},
};

const MAX_NOTE_CHARS: usize = 500;

pub(super) async fn owned(state: &AppState, raw_id: &str, user_id: &str) -> AppResult<list::Model> {
    if uuid::Uuid::parse_str(raw_id).is_err() {
        return Err(AppError::bad_request("Invalid listId."));
    }
    state.store.owned_list(raw_id, user_id).await
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Value>> {
    let lists = state.store.lists_for_user(&user.id).await?;
    Ok(ok(lists.into_iter().map(ListView::from).collect::<Vec<_>>()))
}

#[derive(Debug, Deserialize)]
pub struct CreateList {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub privacy: Privacy,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateList>,
) -> AppResult<Json<Value>> {
    let list = create_list(&state, &user.id, req).await?;
    Ok(ok(ListView::from(list)))
}

pub(super) async fn create_list(state: &AppState, user_id: &str, req: CreateList) -> AppResult<list::Model> {
    Validation::new().check(!req.name.trim().is_empty(), "name", "name is required.").body()?;

    let list = state
        .store
        .create_list(user_id, &req.name, req.description.as_deref(), req.privacy)
        .await?;
    tracing::debug!(list_id = %list.id, user_id = %user_id, "created list");
    Ok(list)
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiPath(list_id): ApiPath<String>,
) -> AppResult<Json<Value>> {
    let list = owned(&state, &list_id, &user.id).await?;
    Ok(ok(ListView::from(list)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateList {
    pub name: Option<String>,
    pub description: Option<String>,
    pub privacy: Option<Privacy>,
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiPath(list_id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdateList>,
) -> AppResult<Json<Value>> {
    let list = owned(&state, &list_id, &user.id).await?;
    Ok(ok(ListView::from(update_list(&state, list, req).await?)))
}

pub(super) async fn update_list(state: &AppState, list: list::Model, req: UpdateList) -> AppResult<list::Model> {
    Validation::new()
        .check(req.name.as_deref().is_none_or(|n| !n.trim().is_empty()), "name", "name cannot be empty.")
        .body()?;

    state
        .store
        .update_list(list, ListChanges { name: req.name, description: req.description, privacy: req.privacy })
        .await
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiPath(list_id): ApiPath<String>,
) -> AppResult<Json<Value>> {
    let list = owned(&state, &list_id, &user.id).await?;
    state.store.delete_list(&list.id).await?;
    Ok(ok_empty())
}

pub async fn items(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiPath(list_id): ApiPath<String>,
) -> AppResult<Json<Value>> {
    let list = owned(&state, &list_id, &user.id).await?;
    Ok(ok(state.store.list_items(&list.id, &user.id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItem {
    pub tmdb_id: i64,
    pub media_type: MediaType,
    pub rank: Option<i32>,
    pub note: Option<String>,
}

pub async fn add_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiPath(list_id): ApiPath<String>,
    ApiJson(req): ApiJson<AddItem>,
) -> AppResult<Json<Value>> {
    let list = owned(&state, &list_id, &user.id).await?;
    let item = add_to_list(&state, &list, req).await?;
    Ok(ok(ListItemRecord::from(item)))
}

pub(super) async fn add_to_list(
    state: &AppState,
    list: &list::Model,
    req: AddItem,
) -> AppResult<list_item::Model> {
    let tmdb_id = i32::try_from(req.tmdb_id).ok().filter(|id| *id > 0);
    Validation::new()
        .check(tmdb_id.is_some(), "tmdbId", "tmdbId must be a positive integer.")
        .check(req.rank.is_none_or(rank_in_range), "rank", "rank must be between 1 and 10000.")
        .body()?;
    let tmdb_id = tmdb_id.unwrap_or_default();

    let title = state.store.require_title(tmdb_id, req.media_type, "adding it to a list").await?;
    state
        .store
        .add_list_item(&list.id, NewListItem { title_id: title.id, rank: req.rank, note: req.note })
        .await
}

fn rank_in_range(rank: i32) -> bool {
    (1..=MAX_RANK).contains(&rank)
}

#[derive(Debug, Deserialize)]
pub struct RankChange {
    pub id: String,
    pub rank: i32,
}

/// `PUT` carries either a full reorder or a single note edit.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UpdateItems {
    Reorder { items: Vec<RankChange> },
    Note { id: String, note: Option<String> },
}

pub async fn update_items(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiPath(list_id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdateItems>,
) -> AppResult<Json<Value>> {
    match req {
        UpdateItems::Reorder { items } => {
            check_reorder(&items)?;
            let list = owned(&state, &list_id, &user.id).await?;
            reorder(&state, &list, items).await?;
            Ok(ok_empty())
        },
        UpdateItems::Note { id, note } => {
            check_note(&id, note.as_deref())?;
            let list = owned(&state, &list_id, &user.id).await?;
            let item = state.store.update_list_item_note(&list.id, &id, note.as_deref()).await?;
            Ok(ok(ListItemRecord::from(item)))
        },
    }
}

pub(super) fn check_reorder(items: &[RankChange]) -> AppResult<()> {
    Validation::new()
        .check(items.iter().all(|i| !i.id.is_empty()), "items", "item id is required.")
        .check(items.iter().all(|i| rank_in_range(i.rank)), "items", "rank must be between 1 and 10000.")
        .body()
}

pub(super) async fn reorder(state: &AppState, list: &list::Model, items: Vec<RankChange>) -> AppResult<()> {
    let ranks: Vec<(String, i32)> = items.into_iter().map(|i| (i.id, i.rank)).collect();
    state.store.reorder_list_items(&list.id, &ranks).await
}

pub(super) fn check_note(id: &str, note: Option<&str>) -> AppResult<()> {
    Validation::new()
        .check(!id.is_empty(), "id", "id is required.")
        .check(
            note.is_none_or(|n| n.chars().count() <= MAX_NOTE_CHARS),
            "note",
            "note must be at most 500 characters.",
        )
        .body()
}

#[derive(Debug, Deserialize)]
pub struct RemoveItem {
    id: String,
}

pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ApiPath(list_id): ApiPath<String>,
    ApiJson(req): ApiJson<RemoveItem>,
) -> AppResult<Json<Value>> {
    Validation::new().check(!req.id.is_empty(), "id", "id is required.").body()?;

    let list = owned(&state, &list_id, &user.id).await?;
    state.store.remove_list_item(&list.id, &req.id).await?;
    Ok(ok_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{models::MediaType, routes::testing::*, store::testing::hydrated};

    struct Ctx {
        app: TestApp,
        cookie: String,
        list_id: String,
    }

    async fn ctx() -> Ctx {
        let app = TestApp::new("http://127.0.0.1:9").await;
        for (id, name) in [(1, "Alien"), (2, "Heat"), (3, "Ronin")] {
            app.state.store.upsert_title(&hydrated(id, MediaType::Movie, name)).await.unwrap();
        }
        let cookie = app.sign_in("lister@x.test").await;
        let created = app
            .send(with_cookie(json("POST", "/api/lists", json!({ "name": "Favourites" })), &cookie))
            .await;
        assert_eq!(created.status(), StatusCode::OK);
        let body = body_json(created).await;
        assert_eq!(body["data"]["privacy"], "public");
        let list_id = body["data"]["id"].as_str().unwrap().to_string();
        Ctx { app, cookie, list_id }
    }

    impl Ctx {
        async fn call(&self, method: &str, suffix: &str, body: Value) -> (StatusCode, Value) {
            let uri = format!("/api/lists/{}{suffix}", self.list_id);
            let resp = self.app.send(with_cookie(json(method, &uri, body), &self.cookie)).await;
            let status = resp.status();
            (status, body_json(resp).await)
        }

        async fn add(&self, tmdb_id: i32, rank: Option<i32>) -> String {
            let (status, body) = self
                .call("POST", "/items", json!({ "tmdbId": tmdb_id, "mediaType": "movie", "rank": rank }))
                .await;
            assert_eq!(status, StatusCode::OK, "{body}");
            body["data"]["id"].as_str().unwrap().to_string()
        }

        async fn order(&self) -> Vec<(String, i64)> {
            let uri = format!("/api/lists/{}/items", self.list_id);
            let body = body_json(self.app.send(with_cookie(get(&uri), &self.cookie)).await).await;
            body["data"]
                .as_array()
                .unwrap()
                .iter()
                .map(|i| (i["title"]["title"].as_str().unwrap().to_string(), i["rank"].as_i64().unwrap()))
                .collect()
        }
    }

    fn pairs(expected: &[(&str, i64)]) -> Vec<(String, i64)> {
        expected.iter().map(|(t, r)| (t.to_string(), *r)).collect()
    }

    #[tokio::test]
    async fn lists_require_session_owner_and_uuid() {
        let c = ctx().await;
        let resp = c.app.send(get("/api/lists")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = c.app.send(with_cookie(get("/api/lists/not-a-uuid"), &c.cookie)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["message"], "Invalid listId.");

        let stranger = c.app.sign_in("stranger@x.test").await;
        let resp = c.app.send(with_cookie(get(&format!("/api/lists/{}", c.list_id)), &stranger)).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let missing = uuid::Uuid::new_v4();
        let resp = c.app.send(with_cookie(get(&format!("/api/lists/{missing}")), &c.cookie)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_crud() {
        let c = ctx().await;
        let (status, body) = c.call("PUT", "", json!({ "name": "Best", "privacy": "private" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Best");
        assert_eq!(body["data"]["privacy"], "private");

        let (status, _) = c.call("PUT", "", json!({ "name": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let all = body_json(c.app.send(with_cookie(get("/api/lists"), &c.cookie)).await).await;
        assert_eq!(all["data"].as_array().unwrap().len(), 1);

        c.add(1, None).await;
        let (status, _) = c.call("DELETE", "", json!(null)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = c.call("GET", "", json!(null)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn items_rank_reorder_note_and_delete() {
        let c = ctx().await;
        let alien = c.add(1, None).await;
        let heat = c.add(2, None).await;
        c.add(3, Some(1)).await;
        assert_eq!(c.order().await, pairs(&[("Ronin", 1), ("Alien", 2), ("Heat", 3)]));

        let (status, _) = c
            .call("PUT", "/items", json!({ "items": [{ "id": alien, "rank": 3 }, { "id": heat, "rank": 2 }] }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(c.order().await, pairs(&[("Ronin", 1), ("Heat", 2), ("Alien", 3)]));

        let (status, _) = c.call("PUT", "/items", json!({ "items": [{ "id": alien, "rank": 1 }] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = c.call("PUT", "/items", json!({ "id": alien, "note": " scary " })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["note"], "scary");

        let (status, _) = c.call("PUT", "/items", json!({ "id": alien, "note": "x".repeat(501) })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = c.call("PUT", "/items", json!({ "bogus": true })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = c.call("DELETE", "/items", json!({ "id": heat })).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = c.call("DELETE", "/items", json!({ "id": heat })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(c.order().await, pairs(&[("Ronin", 1), ("Alien", 3)]));
    }

    #[tokio::test]
    async fn adding_unhydrated_title_is_not_found() {
        let c = ctx().await;
        let (status, body) = c.call("POST", "/items", json!({ "tmdbId": 99, "mediaType": "movie" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["error"]["message"],
            "Title not found. Hydrate the title before adding it to a list."
        );

        let (status, _) = c.call("POST", "/items", json!({ "tmdbId": 1, "mediaType": "movie", "rank": 0 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ranks_are_bounded_on_add_and_reorder() {
        let c = ctx().await;
        let alien = c.add(1, Some(10_000)).await;

        let (status, body) = c.call("POST", "/items", json!({ "tmdbId": 2, "mediaType": "movie" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["details"]["rank"].is_array(), "{body}");

        for rank in [10_000, 10_001, i32::MAX as i64, i64::from(i32::MAX) + 1] {
            let (status, _) = c
                .call("POST", "/items", json!({ "tmdbId": 2, "mediaType": "movie", "rank": rank }))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "rank {rank}");
        }
        assert_eq!(c.order().await, pairs(&[("Alien", 10_000)]));

        for rank in [json!(0), json!(10_001), json!(null), json!("")] {
            let (status, _) = c.call("PUT", "/items", json!({ "items": [{ "id": alien, "rank": rank }] })).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "rank {rank}");
        }
        let (status, _) = c.call("PUT", "/items", json!({ "items": [{ "id": "", "rank": 1 }] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = c.call("PUT", "/items", json!({ "items": [] })).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = c.call("PUT", "/items", json!({ "items": [{ "id": alien, "rank": 1 }] })).await;
        assert_eq!(status, StatusCode::OK);
        c.add(2, None).await;
        assert_eq!(c.order().await, pairs(&[("Alien", 1), ("Heat", 2)]));
    }
}
