use serde::{Deserialize, de::DeserializeOwned};

use crate::catalog::CatalogError;

pub struct TvmazeClient {
    client: reqwest::Client,
    base_url: String,
}

impl TvmazeClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub async fn search_shows(&self, query: &str) -> Result<Vec<SearchEntry>, CatalogError> {
        self.get("/search/shows", &[("q", query)]).await
    }

    pub async fn show(&self, id: i64) -> Result<Show, CatalogError> {
        self.get(&format!("/shows/{id}"), &[]).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        tracing::debug!(%url, "tvmaze request");

        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message: format!("TVmaze request failed with status {}.", status.as_u16()),
            });
        }

        Ok(resp.json().await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchEntry {
    pub show: Show,
}

#[derive(Debug, Default, Deserialize)]
pub struct Show {
    pub id: i64,
    pub name: String,
    pub premiered: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub image: Option<Image>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Image {
    pub medium: Option<String>,
    pub original: Option<String>,
}

impl Show {
    pub fn poster_url(&self) -> Option<String> {
        let image = self.image.as_ref()?;
        image.medium.clone().or_else(|| image.original.clone())
    }
}
