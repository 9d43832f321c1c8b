use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Json},
};
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;
use tracing::{debug, error, warn};

use crate::error::CodeMapperError;
use crate::models::{
    CountryDevelopers, CountrySummary, DataResponse, LeaderboardEntry, LeaderboardView,
    RankingCriterion, ShareLinks,
};
use crate::ranking::{find_ranked, leaderboard};
use crate::share::share_links;
use crate::state::AppState;

/// Query parameters for leaderboard endpoints.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default, deserialize_with = "empty_string_as_none_str")]
    pub criterion: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none_str")]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<usize>,
}

/// Query parameters for the share endpoint.
#[derive(Debug, Deserialize)]
pub struct ShareQuery {
    #[serde(default, deserialize_with = "empty_string_as_none_str")]
    pub criterion: Option<String>,
}

fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

fn empty_string_as_none_str<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Ok(Some(s)),
    }
}

fn render_template(
    tera: &tera::Tera,
    template: &str,
    context: &Context,
) -> Result<Html<String>, CodeMapperError> {
    tera.render(template, context).map(Html).map_err(|e| {
        error!("Template render error for '{}': {}", template, e);
        CodeMapperError::Template(e)
    })
}

fn parse_criterion(raw: Option<&str>) -> Result<RankingCriterion, CodeMapperError> {
    raw.map_or(Ok(RankingCriterion::default()), str::parse)
}

/// Caps a search string so a pasted novel cannot blow up matching.
fn clean_query(q: Option<&String>) -> Option<String> {
    q.map(|q| q.trim().chars().take(100).collect())
}

/// Loads and ranks one country's developers into the shared view model.
async fn build_leaderboard(
    state: &AppState,
    country: &str,
    query: &LeaderboardQuery,
) -> Result<LeaderboardView, CodeMapperError> {
    let criterion = parse_criterion(query.criterion.as_deref())?;
    let search = clean_query(query.q.as_ref());
    let limit = query.limit.unwrap_or(state.config.top_k).clamp(1, 100);

    let developers = state.store.fetch_developers(country).await?;
    let ranked = leaderboard(&developers, criterion, search.as_deref(), limit);
    debug!(
        "Leaderboard for {} by {}: {} of {} developers",
        country,
        criterion,
        ranked.len(),
        developers.len()
    );

    Ok(LeaderboardView {
        country: country.trim().to_string(),
        criterion,
        criterion_label: criterion.label(),
        query: search,
        total_developers: developers.len(),
        entries: ranked
            .iter()
            .map(|entry| LeaderboardEntry::from_ranked(entry, criterion))
            .collect(),
    })
}

/// GET / - Map page with country hotspots and criterion tabs.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, CodeMapperError> {
    let countries = state.countries().await;
    let hotspots = state.hotspots().await;

    let mut context = Context::new();
    context.insert("countries", &countries);
    context.insert("hotspots", &hotspots);
    context.insert("criteria", &criteria_tabs());
    context.insert("map_width", &state.config.map_width);
    context.insert("map_height", &state.config.map_height);

    render_template(&state.tera, "index.html", &context)
}

/// GET /get_countries - Countries available in the cache directory.
pub async fn get_countries(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.countries().await)
}

/// GET /api/countries - Same country list inside a `data` envelope.
pub async fn api_countries(State(state): State<Arc<AppState>>) -> Json<DataResponse<CountrySummary>> {
    Json(DataResponse {
        data: state.countries().await,
    })
}

/// GET /api/developers - Raw developer lists for every cached country.
/// Countries whose file cannot be loaded are left out.
pub async fn api_developers(State(state): State<Arc<AppState>>) -> Json<DataResponse<CountryDevelopers>> {
    let mut data = Vec::new();
    for country in state.countries().await {
        match state.store.fetch_developers(&country.name).await {
            Ok(developers) => data.push(CountryDevelopers {
                country: country.name,
                developers,
            }),
            Err(e) => warn!("Leaving {} out of /api/developers: {}", country.name, e),
        }
    }
    Json(DataResponse { data })
}

/// GET /api/hotspots - Clickable map regions.
pub async fn api_hotspots(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.hotspots().await)
}

/// GET /api/countries/{country}/developers - Ranked leaderboard as JSON.
pub async fn api_country_developers(
    State(state): State<Arc<AppState>>,
    Path(country): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardView>, CodeMapperError> {
    build_leaderboard(&state, &country, &query).await.map(Json)
}

/// GET /countries/{country} - Leaderboard page.
pub async fn country_page(
    State(state): State<Arc<AppState>>,
    Path(country): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Html<String>, CodeMapperError> {
    let view = build_leaderboard(&state, &country, &query).await?;

    let mut context = Context::new();
    context.insert("view", &view);
    context.insert("criteria", &criteria_tabs());

    render_template(&state.tera, "leaderboard.html", &context)
}

/// GET /api/share/{country}/{login} - Share text and intent URLs.
pub async fn api_share(
    State(state): State<Arc<AppState>>,
    Path((country, login)): Path<(String, String)>,
    Query(query): Query<ShareQuery>,
) -> Result<Json<ShareLinks>, CodeMapperError> {
    let criterion = parse_criterion(query.criterion.as_deref())?;
    let developers = state.store.fetch_developers(&country).await?;
    let entry = find_ranked(&developers, criterion, &login)
        .ok_or_else(|| CodeMapperError::DeveloperNotFound(login.clone()))?;

    share_links(&entry, country.trim(), criterion).map(Json)
}

#[derive(serde::Serialize)]
struct CriterionTab {
    key: &'static str,
    label: &'static str,
}

fn criteria_tabs() -> Vec<CriterionTab> {
    RankingCriterion::ALL
        .iter()
        .map(|c| CriterionTab {
            key: c.as_str(),
            label: c.label(),
        })
        .collect()
}
