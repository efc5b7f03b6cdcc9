//! Catalog adapter: one search/detail surface over TMDB with a TVmaze fallback.

use std::sync::{Arc, LazyLock};

use thiserror::Error;

use crate::{
    dates,
    models::{CatalogResult, CatalogSearchResponse, CatalogSource, HydratedTitle, MediaType, SearchType},
    tmdb::{self, TmdbClient},
    tvmaze::{self, TvmazeClient},
};

const TMDB_POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
const TMDB_BACKDROP_BASE: &str = "https://image.tmdb.org/t/p/w780";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TMDB_API_KEY is not configured.")]
    MissingApiKey,

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("TMDB title missing name.")]
    MissingName,

    #[error("TVmaze only supports tv mediaType.")]
    UnsupportedMediaType,

    #[error("Catalog id {0} is out of range.")]
    IdOutOfRange(i64),

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct Catalog {
    tmdb: Arc<TmdbClient>,
    tvmaze: Arc<TvmazeClient>,
}

impl Catalog {
    pub fn new(tmdb: TmdbClient, tvmaze: TvmazeClient) -> Self {
        Self { tmdb: Arc::new(tmdb), tvmaze: Arc::new(tvmaze) }
    }

    pub async fn search(
        &self,
        query: &str,
        kind: SearchType,
        page: u32,
    ) -> Result<CatalogSearchResponse, CatalogError> {
        let resp = self.tmdb.search(query, kind, page).await?;
        let results = map_tmdb_results(&resp.results, kind);

        if !results.is_empty() {
            return Ok(CatalogSearchResponse {
                page: resp.page,
                total_results: resp.total_results,
                results,
            });
        }

        if kind == SearchType::Movie {
            return Ok(CatalogSearchResponse { page: resp.page, total_results: 0, results: vec![] });
        }

        tracing::debug!(query, "no TMDB matches, falling back to TVmaze");
        let shows = self.tvmaze.search_shows(query).await?;
        let results: Vec<_> = shows.iter().map(|entry| map_tvmaze_show(&entry.show)).collect();

        Ok(CatalogSearchResponse { page: 1, total_results: results.len() as u64, results })
    }

    /// Fetches full metadata for one title so it can be hydrated locally.
    pub async fn fetch_title(
        &self,
        source: CatalogSource,
        external_id: i64,
        media_type: MediaType,
    ) -> Result<HydratedTitle, CatalogError> {
        match source {
            CatalogSource::Tmdb => {
                let details = self.tmdb.details(external_id, media_type).await?;
                hydrate_from_tmdb(details, media_type)
            },
            CatalogSource::Tvmaze => {
                if media_type != MediaType::Tv {
                    return Err(CatalogError::UnsupportedMediaType);
                }
                let show = self.tvmaze.show(external_id).await?;
                hydrate_from_tvmaze(show)
            },
        }
    }

    /// Cheap upstream check used by the health endpoint.
    pub async fn ping(&self) -> Result<(), CatalogError> {
        self.tmdb.search("matrix", SearchType::Movie, 1).await.map(|_| ())
    }
}

pub fn map_tmdb_results(items: &[tmdb::SearchItem], kind: SearchType) -> Vec<CatalogResult> {
    items
        .iter()
        .filter_map(|item| {
            let media_type = match kind {
                SearchType::Movie => MediaType::Movie,
                SearchType::Tv => MediaType::Tv,
                SearchType::Multi => match item.media_type.as_deref() {
                    Some("movie") => MediaType::Movie,
                    Some("tv") => MediaType::Tv,
                    _ => return None,
                },
            };

            let (title, release_date) = match media_type {
                MediaType::Movie => (item.title.as_ref(), item.release_date.as_deref()),
                MediaType::Tv => (item.name.as_ref(), item.first_air_date.as_deref()),
            };

            Some(CatalogResult {
                source: CatalogSource::Tmdb,
                media_type,
                external_id: item.id,
                title: title.filter(|t| !t.is_empty())?.clone(),
                year: dates::extract_year(release_date),
                overview: item.overview.clone(),
                poster_url: item.poster_path.as_ref().map(|p| format!("{TMDB_POSTER_BASE}{p}")),
                backdrop_url: item
                    .backdrop_path
                    .as_ref()
                    .map(|p| format!("{TMDB_BACKDROP_BASE}{p}")),
            })
        })
        .collect()
}

pub fn map_tvmaze_show(show: &tvmaze::Show) -> CatalogResult {
    CatalogResult {
        source: CatalogSource::Tvmaze,
        media_type: MediaType::Tv,
        external_id: show.id,
        title: show.name.clone(),
        year: dates::extract_year(show.premiered.as_deref()),
        overview: strip_html(show.summary.as_deref()),
        poster_url: show.poster_url(),
        backdrop_url: None,
    }
}

fn hydrate_from_tmdb(
    details: tmdb::Details,
    media_type: MediaType,
) -> Result<HydratedTitle, CatalogError> {
    let (name, release_date, runtime) = match media_type {
        MediaType::Movie => (details.title.clone(), details.release_date, details.runtime),
        MediaType::Tv => (
            details.name.clone(),
            details.first_air_date,
            details.episode_run_time.first().copied(),
        ),
    };
    let title = name.filter(|n| !n.is_empty()).ok_or(CatalogError::MissingName)?;
    let tmdb_id = i32::try_from(details.id).map_err(|_| CatalogError::IdOutOfRange(details.id))?;

    Ok(HydratedTitle {
        tmdb_id,
        media_type,
        source: CatalogSource::Tmdb,
        title,
        original_title: details
            .original_title
            .or(details.original_name)
            .or(details.title)
            .or(details.name),
        overview: details.overview.filter(|o| !o.is_empty()),
        poster_path: details.poster_path,
        backdrop_path: details.backdrop_path,
        runtime_minutes: runtime,
        genres: details.genres.into_iter().map(|g| g.name).collect(),
        release_date: normalize_date(release_date),
        vote_average: details.vote_average,
    })
}

fn hydrate_from_tvmaze(show: tvmaze::Show) -> Result<HydratedTitle, CatalogError> {
    let poster_path = show.poster_url();
    let tmdb_id = i32::try_from(show.id).map_err(|_| CatalogError::IdOutOfRange(show.id))?;
    Ok(HydratedTitle {
        tmdb_id,
        media_type: MediaType::Tv,
        source: CatalogSource::Tvmaze,
        title: show.name,
        original_title: None,
        overview: strip_html(show.summary.as_deref()),
        poster_path,
        backdrop_path: None,
        runtime_minutes: None,
        genres: show.genres,
        release_date: normalize_date(show.premiered),
        vote_average: None,
    })
}

fn normalize_date(raw: Option<String>) -> Option<String> {
    raw.as_deref().and_then(dates::parse_date).map(|d| d.to_string())
}

static TAG_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// Removes HTML tags; blank results become `None`.
pub fn strip_html(input: Option<&str>) -> Option<String> {
    let stripped = TAG_RE.replace_all(input?, "");
    let trimmed = stripped.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;

    fn item(id: i64, media_type: Option<&str>) -> tmdb::SearchItem {
        tmdb::SearchItem {
            id,
            media_type: media_type.map(str::to_string),
            title: Some(format!("Movie {id}")),
            name: Some(format!("Show {id}")),
            release_date: Some("2001-09-01".to_string()),
            first_air_date: Some("1998-01-20".to_string()),
            overview: Some("o".to_string()),
            poster_path: Some("/p.jpg".to_string()),
            backdrop_path: None,
        }
    }

    fn catalog(server: &MockServer) -> Catalog {
        let http = reqwest::Client::new();
        Catalog::new(
            TmdbClient::new(http.clone(), "k".to_string(), server.uri(), 100),
            TvmazeClient::new(http, server.uri()),
        )
    }

    #[test]
    fn multi_search_keeps_only_movies_and_tv() {
        let items = vec![item(1, Some("movie")), item(2, Some("person")), item(3, Some("tv"))];
        let results = map_tmdb_results(&items, SearchType::Multi);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Movie 1");
        assert_eq!(results[0].year, Some(2001));
        assert_eq!(results[0].poster_url.as_deref(), Some("https://image.tmdb.org/t/p/w500/p.jpg"));
        assert_eq!(results[1].media_type, MediaType::Tv);
        assert_eq!(results[1].title, "Show 3");
        assert_eq!(results[1].year, Some(1998));
    }

    #[test]
    fn typed_search_ignores_media_type_field_and_drops_nameless() {
        let mut nameless = item(5, None);
        nameless.name = None;
        let results = map_tmdb_results(&[item(4, None), nameless], SearchType::Tv);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].external_id, 4);
    }

    #[test]
    fn strips_markup() {
        assert_eq!(strip_html(Some("<p>A <b>bold</b> show.</p>")).as_deref(), Some("A bold show."));
        assert_eq!(strip_html(Some("<p> </p>")), None);
        assert_eq!(strip_html(None), None);
    }

    #[test]
    fn tmdb_tv_details_use_episode_runtime() {
        let details = tmdb::Details {
            id: 1399,
            name: Some("Game of Thrones".to_string()),
            first_air_date: Some("2011-04-17".to_string()),
            episode_run_time: vec![60, 55],
            genres: vec![tmdb::Genre { name: "Drama".to_string() }],
            ..Default::default()
        };
        let hydrated = hydrate_from_tmdb(details, MediaType::Tv).unwrap();
        assert_eq!(hydrated.title, "Game of Thrones");
        assert_eq!(hydrated.runtime_minutes, Some(60));
        assert_eq!(hydrated.release_date.as_deref(), Some("2011-04-17"));
        assert_eq!(hydrated.genres, vec!["Drama".to_string()]);
    }

    #[test]
    fn tmdb_details_without_name_fail() {
        let details = tmdb::Details { id: 7, name: Some("Only a tv name".into()), ..Default::default() };
        assert!(matches!(
            hydrate_from_tmdb(details, MediaType::Movie),
            Err(CatalogError::MissingName)
        ));
    }

    #[test]
    fn oversized_upstream_ids_are_out_of_range() {
        let id = i64::from(i32::MAX) + 1;
        let details = tmdb::Details { id, title: Some("Too Big".into()), ..Default::default() };
        assert!(matches!(
            hydrate_from_tmdb(details, MediaType::Movie),
            Err(CatalogError::IdOutOfRange(got)) if got == id
        ));
    }

    #[tokio::test]
    async fn falls_back_to_tvmaze_when_tmdb_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/multi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "page": 1, "total_results": 0, "results": []
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/shows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "score": 1.0, "show": {
                    "id": 82, "name": "Obscure Show", "premiered": "2015-01-01",
                    "summary": "<p>Quiet.</p>", "image": { "medium": "http://img/m.jpg" }
                }}
            ])))
            .mount(&server)
            .await;

        let resp = catalog(&server).search("obscure", SearchType::Multi, 3).await.unwrap();
        assert_eq!(resp.page, 1);
        assert_eq!(resp.total_results, 1);
        let hit = &resp.results[0];
        assert_eq!(hit.source, CatalogSource::Tvmaze);
        assert_eq!(hit.overview.as_deref(), Some("Quiet."));
        assert_eq!(hit.backdrop_url, None);
    }

    #[tokio::test]
    async fn movie_search_never_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "page": 1, "total_results": 0, "results": []
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/shows"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let resp = catalog(&server).search("nothing", SearchType::Movie, 1).await.unwrap();
        assert!(resp.results.is_empty());
        assert_eq!(resp.total_results, 0);
    }

    #[tokio::test]
    async fn tvmaze_hydrate_rejects_movies() {
        let server = MockServer::start().await;
        let err = catalog(&server)
            .fetch_title(CatalogSource::Tvmaze, 1, MediaType::Movie)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnsupportedMediaType));
    }
}
