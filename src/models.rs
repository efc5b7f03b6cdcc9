use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    dates,
    entities::{diary_entry, list, list_item, review, title},
};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    #[sea_orm(string_value = "movie")]
    Movie,
    #[sea_orm(string_value = "tv")]
    Tv,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    #[default]
    #[sea_orm(string_value = "tmdb")]
    Tmdb,
    #[sea_orm(string_value = "tvmaze")]
    Tvmaze,
}

impl CatalogSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogSource::Tmdb => "tmdb",
            CatalogSource::Tvmaze => "tvmaze",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Movie,
    Tv,
    #[default]
    Multi,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Movie => "movie",
            SearchType::Tv => "tv",
            SearchType::Multi => "multi",
        }
    }
}

#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "private")]
    Private,
    #[sea_orm(string_value = "friends")]
    Friends,
}

/// One catalog search hit, regardless of which upstream produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResult {
    pub source: CatalogSource,
    pub media_type: MediaType,
    pub external_id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSearchResponse {
    pub page: u32,
    pub total_results: u64,
    pub results: Vec<CatalogResult>,
}

/// Normalized metadata ready to be upserted into the title table.
#[derive(Clone, Debug, PartialEq)]
pub struct HydratedTitle {
    pub tmdb_id: i32,
    pub media_type: MediaType,
    pub source: CatalogSource,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub genres: Vec<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleView {
    pub id: String,
    pub tmdb_id: i32,
    pub media_type: MediaType,
    pub source: CatalogSource,
    pub title: String,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub genres: Vec<String>,
    pub vote_average: Option<f64>,
    pub created_at: Option<String>,
}

impl From<title::Model> for TitleView {
    fn from(t: title::Model) -> Self {
        let genres = t.genre_names();
        Self {
            id: t.id,
            tmdb_id: t.tmdb_id,
            media_type: t.media_type,
            source: t.source,
            title: t.title,
            original_title: t.original_title,
            release_date: t.release_date,
            poster_path: t.poster_path,
            backdrop_path: t.backdrop_path,
            overview: t.overview,
            runtime_minutes: t.runtime_minutes,
            genres,
            vote_average: None,
            created_at: Some(dates::format_timestamp(t.created_at)),
        }
    }
}

impl TitleView {
    /// Detail view for a title that has not been hydrated locally.
    pub fn from_remote(h: HydratedTitle) -> Self {
        Self {
            id: format!("tmdb-{}", h.tmdb_id),
            tmdb_id: h.tmdb_id,
            media_type: h.media_type,
            source: h.source,
            title: h.title,
            original_title: h.original_title,
            release_date: h.release_date,
            poster_path: h.poster_path,
            backdrop_path: h.backdrop_path,
            overview: h.overview,
            runtime_minutes: h.runtime_minutes,
            genres: h.genres,
            vote_average: h.vote_average,
            created_at: None,
        }
    }
}

/// The subset of title fields embedded in reviews, diary entries and list items.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleSummary {
    pub tmdb_id: i32,
    pub media_type: MediaType,
    pub title: String,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

impl From<&title::Model> for TitleSummary {
    fn from(t: &title::Model) -> Self {
        Self {
            tmdb_id: t.tmdb_id,
            media_type: t.media_type,
            title: t.title.clone(),
            release_date: t.release_date.clone(),
            poster_path: t.poster_path.clone(),
            backdrop_path: t.backdrop_path.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: String,
    pub title: TitleSummary,
    pub watched_on: Option<String>,
    pub rating: Option<f64>,
    pub contains_spoilers: bool,
    pub liked: bool,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ReviewView {
    pub fn new(review: review::Model, title: &title::Model, tags: Vec<String>) -> Self {
        Self {
            id: review.id,
            title: TitleSummary::from(title),
            watched_on: review.watched_on,
            rating: review.rating,
            contains_spoilers: review.contains_spoilers,
            liked: review.liked,
            body: review.body,
            tags,
            created_at: dates::format_timestamp(review.created_at),
            updated_at: dates::format_timestamp(review.updated_at),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntryView {
    pub id: String,
    pub watched_on: String,
    pub rating: Option<f64>,
    pub liked: bool,
    pub rewatch: bool,
    pub notes: Option<String>,
    pub created_at: String,
    pub title: Option<TitleSummary>,
}

impl DiaryEntryView {
    pub fn new(entry: diary_entry::Model, title: Option<&title::Model>) -> Self {
        Self {
            id: entry.id,
            watched_on: entry.watched_on,
            rating: entry.rating,
            liked: entry.liked,
            rewatch: entry.rewatch,
            notes: entry.notes,
            created_at: dates::format_timestamp(entry.created_at),
            title: title.map(TitleSummary::from),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryStats {
    pub total: u64,
    pub year_count: u64,
    pub month_count: u64,
    pub avg_rating: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub privacy: Privacy,
    pub created_at: String,
    pub updated_at: String,
}

impl From<list::Model> for ListView {
    fn from(l: list::Model) -> Self {
        Self {
            id: l.id,
            user_id: l.user_id,
            name: l.name,
            description: l.description,
            privacy: l.privacy,
            created_at: dates::format_timestamp(l.created_at),
            updated_at: dates::format_timestamp(l.updated_at),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemRecord {
    pub id: String,
    pub list_id: String,
    pub title_id: String,
    pub rank: i32,
    pub note: Option<String>,
    pub created_at: String,
}

impl From<list_item::Model> for ListItemRecord {
    fn from(i: list_item::Model) -> Self {
        Self {
            id: i.id,
            list_id: i.list_id,
            title_id: i.title_id,
            rank: i.rank,
            note: i.note,
            created_at: dates::format_timestamp(i.created_at),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestReview {
    pub id: String,
    pub rating: Option<f64>,
    pub watched_on: Option<String>,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemView {
    pub id: String,
    pub rank: i32,
    pub note: Option<String>,
    pub title: TitleSummary,
    pub latest_review: Option<LatestReview>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DbStats {
    pub titles: u64,
    pub reviews: u64,
    pub lists: u64,
}
