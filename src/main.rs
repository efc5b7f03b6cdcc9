mod admin;
mod catalog;
mod config;
mod dates;
mod db;
mod entities;
mod error;
mod extract;
mod models;
mod password;
mod rate_limit;
mod routes;
mod seed;
mod session;
mod store;
mod templates;
mod tmdb;
mod tvmaze;

use std::{sync::Arc, time::Duration};

use clap::{Parser, Subcommand};

use crate::{
    catalog::Catalog, config::Config, rate_limit::SearchRateLimiter, store::Store,
    tmdb::TmdbClient, tvmaze::TvmazeClient,
};

pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub catalog: Catalog,
    pub search_limiter: SearchRateLimiter,
}

/// Film and TV diary, reviews, and ranked lists.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Subcommand to run; defaults to `serve`.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve,
    /// Insert an example title and diary entry.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movieboxd=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(Config::from_env()?);
    let store = Store::new(db::connect_and_migrate(&config.database_url).await?);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Seed => seed::run(&store).await?,
        Commands::Serve => serve(config, store).await?,
    }
    Ok(())
}

async fn serve(config: Arc<Config>, store: Store) -> anyhow::Result<()> {
    let http = reqwest::Client::builder()
        .user_agent("movieboxd/0.1")
        .timeout(Duration::from_secs(30))
        .build()?;

    let state = Arc::new(AppState {
        catalog: build_catalog(http, &config),
        search_limiter: SearchRateLimiter::per_minute(config.search_rate_per_minute),
        config: config.clone(),
        store,
    });
    state.search_limiter.spawn_pruner(Duration::from_secs(300));

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, readonly = config.public_readonly, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_catalog(http: reqwest::Client, config: &Config) -> Catalog {
    let tmdb = TmdbClient::new(
        http.clone(),
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_rps,
    );
    let tvmaze = TvmazeClient::new(http, config.tvmaze_base_url.clone());
    Catalog::new(tmdb, tvmaze)
}

#[cfg(test)]
pub(crate) async fn test_state(config: Config) -> AppState {
    let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();
    AppState {
        catalog: build_catalog(reqwest::Client::new(), &config),
        search_limiter: SearchRateLimiter::per_minute(config.search_rate_per_minute),
        config: Arc::new(config),
        store: Store::new(db),
    }
}
