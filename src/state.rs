use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tera::Tera;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::data::{country_key, load_explicit_regions, CacheStore};
use crate::error::CodeMapperError;
use crate::layout::{fallback_regions, region_for, validate_bounds};
use crate::models::{CountrySummary, HotspotRegion};

/// Credentials for the optional edge-cache purge job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeSettings {
    pub token: String,
    pub deployment_url: String,
    pub project_id: String,
}

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to.
    pub bind_address: String,
    /// Directory holding the per-country JSON files.
    pub cache_dir: PathBuf,
    /// Glob for the Tera templates.
    pub templates_glob: String,
    /// Map size in pixels, used for generated hotspots.
    pub map_width: u32,
    pub map_height: u32,
    /// Optional JSON file of hand-placed hotspots; countries missing from it
    /// get a generated region.
    pub hotspots_file: Option<PathBuf>,
    /// Number of developers shown when no search is active.
    pub top_k: usize,
    /// Cron expression for re-scanning the cache directory.
    pub refresh_cron: String,
    /// Set only when all three purge variables are present.
    pub purge: Option<PurgeSettings>,
}

impl Config {
    /// Creates Config from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a Config from any key lookup; unparsable numbers keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let string_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.into())
        };

        let purge = match (
            lookup("VERCEL_TOKEN"),
            lookup("VERCEL_DEPLOYMENT_URL"),
            lookup("VERCEL_PROJECT_ID"),
        ) {
            (Some(token), Some(deployment_url), Some(project_id)) => Some(PurgeSettings {
                token,
                deployment_url,
                project_id,
            }),
            _ => None,
        };

        Self {
            bind_address: string_or("BIND_ADDRESS", "0.0.0.0:8000"),
            cache_dir: PathBuf::from(string_or("CACHE_DIR", "cache")),
            templates_glob: string_or("TEMPLATES_GLOB", "templates/**/*.html"),
            map_width: parse_or(&lookup, "MAP_WIDTH", 800),
            map_height: parse_or(&lookup, "MAP_HEIGHT", 600),
            hotspots_file: lookup("HOTSPOTS_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            top_k: parse_or(&lookup, "TOP_K", 5),
            refresh_cron: string_or("REFRESH_CRON", "0 */10 * * * *"),
            purge,
        }
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), CodeMapperError> {
        validate_bounds(self.map_width, self.map_height)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}

/// Countries found in the cache directory, with their hotspots.
#[derive(Debug, Clone, Default)]
pub struct CountryIndex {
    pub countries: Vec<CountrySummary>,
    /// False when the cache directory could not be listed at all.
    pub listed: bool,
}

/// Shared application state passed to all request handlers.
#[derive(Debug)]
pub struct AppState {
    /// Template engine for rendering HTML pages.
    pub tera: Tera,
    pub config: Config,
    pub store: CacheStore,
    /// Country list with hotspots, rebuilt by the refresh job.
    pub index: RwLock<CountryIndex>,
}

impl AppState {
    pub fn new(tera: Tera, config: Config) -> Self {
        let store = CacheStore::new(config.cache_dir.clone());
        let index = build_country_index(&store, &config);
        Self {
            tera,
            config,
            store,
            index: RwLock::new(index),
        }
    }

    pub async fn countries(&self) -> Vec<CountrySummary> {
        self.index.read().await.countries.clone()
    }

    /// Re-scans the cache directory on the blocking pool and swaps in the
    /// new country list.
    pub async fn refresh_countries(&self) -> Result<usize, CodeMapperError> {
        let store = self.store.clone();
        let config = self.config.clone();
        let index = tokio::task::spawn_blocking(move || build_country_index(&store, &config)).await?;
        let count = index.countries.len();
        *self.index.write().await = index;
        info!("Country index refreshed: {} countries", count);
        Ok(count)
    }

    /// Hotspots for every known country, or the built-in table when the
    /// cache directory could not be listed.
    pub async fn hotspots(&self) -> Vec<HotspotRegion> {
        let index = self.index.read().await;
        if !index.listed {
            return fallback_regions();
        }
        index.countries.iter().filter_map(|c| c.region.clone()).collect()
    }
}

/// Lists cached countries and attaches a hotspot to each, preferring the
/// hand-placed region from `hotspots_file` when there is one.
/// An unreadable directory produces an empty, unlisted index.
pub fn build_country_index(store: &CacheStore, config: &Config) -> CountryIndex {
    let explicit = explicit_regions(config);
    let names = match store.list_countries() {
        Ok(names) => names,
        Err(e) => {
            warn!("Cannot list countries in {:?}: {}", store.root(), e);
            return CountryIndex::default();
        }
    };

    let countries = names
        .into_iter()
        .map(|name| {
            let hand_placed = explicit.get(&country_key(&name));
            let region = match region_for(&name, hand_placed, config.map_width, config.map_height) {
                Ok(region) => Some(region),
                Err(e) => {
                    warn!("No hotspot for {}: {}", name, e);
                    None
                }
            };
            CountrySummary {
                name,
                code: String::new(),
                region,
            }
        })
        .collect();

    CountryIndex {
        countries,
        listed: true,
    }
}

fn explicit_regions(config: &Config) -> HashMap<String, HotspotRegion> {
    let Some(path) = &config.hotspots_file else {
        return HashMap::new();
    };
    load_explicit_regions(path).unwrap_or_else(|e| {
        warn!("Ignoring hotspots file {:?}: {}", path, e);
        HashMap::new()
    })
}
