mod data;
mod error;
mod fetcher;
mod handlers;
mod layout;
mod models;
mod ranking;
mod share;
mod state;

use anyhow::Context as _;
use axum::{routing::get, Router};
use std::sync::Arc;
use tera::Tera;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::CodeMapperError;
use crate::fetcher::purge_remote_cache;
use crate::state::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("codemapper=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    config.validate().context("invalid map configuration")?;

    let tera = Tera::new(&config.templates_glob)
        .with_context(|| format!("parsing templates from {}", config.templates_glob))?;

    if let Some(purge) = config.purge.clone() {
        tokio::spawn(async move {
            if let Err(e) = purge_remote_cache(&purge).await {
                error!("Cache purge failed: {}", e);
            }
        });
    }

    let state = Arc::new(AppState::new(tera, config));
    info!(
        "Serving {} countries from {:?}",
        state.countries().await.len(),
        state.config.cache_dir
    );

    let scheduler = start_refresh_scheduler(Arc::clone(&state))
        .await
        .context("starting refresh scheduler")?;

    let listener = tokio::net::TcpListener::bind(&state.config.bind_address)
        .await
        .with_context(|| format!("binding {}", state.config.bind_address))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;

    drop(scheduler);
    Ok(())
}

/// Builds the router with every page, API route and the static cache mount.
fn app(state: Arc<AppState>) -> Router {
    let cache_files = ServeDir::new(&state.config.cache_dir);

    Router::new()
        .route("/", get(handlers::index))
        .route("/get_countries", get(handlers::get_countries))
        .route("/api/countries", get(handlers::api_countries))
        .route("/api/developers", get(handlers::api_developers))
        .route("/api/hotspots", get(handlers::api_hotspots))
        .route(
            "/api/countries/{country}/developers",
            get(handlers::api_country_developers),
        )
        .route("/countries/{country}", get(handlers::country_page))
        .route("/api/share/{country}/{login}", get(handlers::api_share))
        .nest_service("/cache", cache_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Re-scans the cache directory on the configured cron schedule.
async fn start_refresh_scheduler(state: Arc<AppState>) -> Result<JobScheduler, CodeMapperError> {
    let scheduler = JobScheduler::new().await?;
    let cron = state.config.refresh_cron.clone();

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let state = Arc::clone(&state);
        Box::pin(async move {
            if let Err(e) = state.refresh_countries().await {
                error!("Country refresh failed: {}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("Country refresh scheduled with cron '{}'", cron);
    Ok(scheduler)
}
