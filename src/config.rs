use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tvmaze_base_url: String,
    pub tmdb_rps: u32,
    pub search_rate_per_minute: u32,
    pub public_readonly: bool,
    pub admin_passphrase: Option<String>,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://movieboxd.db?mode=rwc".to_string());

        let tmdb_api_key = std::env::var("TMDB_API_KEY").unwrap_or_else(|_| "".to_string());
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());
        let tvmaze_base_url = std::env::var("TVMAZE_BASE_URL")
            .unwrap_or_else(|_| "https://api.tvmaze.com".to_string());
        reqwest::Url::parse(&tvmaze_base_url)
            .context("TVMAZE_BASE_URL must be a valid URL")?;

        let tmdb_rps: u32 =
            std::env::var("TMDB_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        let search_rate_per_minute: u32 = std::env::var("SEARCH_RATE_PER_MINUTE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let public_readonly = match std::env::var("PUBLIC_READONLY").as_deref() {
            Ok("false") => false,
            Ok("true") | Err(_) => true,
            Ok(other) => anyhow::bail!("PUBLIC_READONLY must be \"true\" or \"false\", got {other:?}"),
        };

        let admin_passphrase =
            std::env::var("ADMIN_PASSPHRASE").ok().filter(|s| !s.is_empty());

        let production = std::env::var("APP_ENV").is_ok_and(|v| v == "production");

        if public_readonly && admin_passphrase.is_none() {
            tracing::warn!(
                "PUBLIC_READONLY is true but ADMIN_PASSPHRASE is missing; writes will be blocked"
            );
        }

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            tmdb_api_key,
            tmdb_base_url,
            tvmaze_base_url,
            tmdb_rps,
            search_rate_per_minute,
            public_readonly,
            admin_passphrase,
            production,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(tmdb_base_url: &str, tvmaze_base_url: &str) -> Self {
        Self {
            addr: "127.0.0.1:0".parse().expect("valid addr"),
            database_url: "sqlite::memory:".to_string(),
            tmdb_api_key: "test-key".to_string(),
            tmdb_base_url: tmdb_base_url.to_string(),
            tvmaze_base_url: tvmaze_base_url.to_string(),
            tmdb_rps: 1000,
            search_rate_per_minute: 30,
            public_readonly: true,
            admin_passphrase: Some("letmein".to_string()),
            production: false,
        }
    }
}
