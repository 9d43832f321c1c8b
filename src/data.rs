//! Data loading module - reads per-country developer files from the cache directory.
//!
//! Each country lives in `<cache_dir>/<key>.json`, where the key is the
//! lowercased country name with whitespace runs replaced by `_`. A handful of
//! exported files carry a trailing underscore (`<key>_.json`), so lookups
//! retry with that suffix before giving up.

use itertools::Itertools;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::CodeMapperError;
use crate::models::{DeveloperRecord, HotspotRegion};

/// File-name key for a country: `"United States"` -> `"united_states"`.
pub fn country_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .join("_")
}

/// Display name for a cache file stem: `"united_states"` -> `"United States"`.
pub fn country_display_name(stem: &str) -> String {
    stem.split('_')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Read-only view of the country cache directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads the developer list for `country`.
    ///
    /// Tries `<key>.json` first, then `<key>_.json` unless the key already
    /// ends with an underscore.
    ///
    /// # Errors
    ///
    /// Returns `CodeMapperError::CountryNotFound` if neither file can be
    /// read and parsed.
    pub fn load_developers(&self, country: &str) -> Result<Vec<DeveloperRecord>, CodeMapperError> {
        let key = country_key(country);
        if key.is_empty() {
            return Err(CodeMapperError::CountryNotFound(country.to_string()));
        }

        let mut candidates = vec![key.clone()];
        if !key.ends_with('_') {
            candidates.push(format!("{key}_"));
        }

        for candidate in &candidates {
            let path = self.root.join(format!("{candidate}.json"));
            match read_developer_file(&path) {
                Ok(developers) => {
                    debug!(
                        "Loaded {} developers for '{}' from {:?}",
                        developers.len(),
                        country,
                        path
                    );
                    return Ok(developers);
                }
                Err(CodeMapperError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("No cache file at {:?}", path);
                }
                Err(e) => warn!("Skipping unreadable cache file {:?}: {}", path, e),
            }
        }

        Err(CodeMapperError::CountryNotFound(country.to_string()))
    }

    /// [`CacheStore::load_developers`] on the blocking pool, for async callers.
    pub async fn fetch_developers(&self, country: &str) -> Result<Vec<DeveloperRecord>, CodeMapperError> {
        let store = self.clone();
        let country = country.to_string();
        tokio::task::spawn_blocking(move || store.load_developers(&country)).await?
    }

    /// Lists every country that has a cache file, sorted by display name.
    ///
    /// # Errors
    ///
    /// Returns `CodeMapperError::Io` if the directory cannot be read.
    pub fn list_countries(&self) -> Result<Vec<String>, CodeMapperError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                let name = country_display_name(stem);
                if !name.is_empty() {
                    names.push(name);
                }
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// Loads hand-placed hotspots (a JSON array of regions), keyed by country key.
pub fn load_explicit_regions(path: &Path) -> Result<HashMap<String, HotspotRegion>, CodeMapperError> {
    let content = fs::read_to_string(path)?;
    let regions: Vec<HotspotRegion> = serde_json::from_str(&content)?;
    Ok(regions
        .into_iter()
        .map(|region| (country_key(&region.country_name), region))
        .collect())
}

/// Reads one country file: a JSON array of developer records.
///
/// Records are decoded one at a time; an element without a usable login is
/// skipped so the rest of the country still ranks.
fn read_developer_file(path: &Path) -> Result<Vec<DeveloperRecord>, CodeMapperError> {
    let content = fs::read_to_string(path)?;
    let values: Vec<Value> = serde_json::from_str(&content)?;
    Ok(values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping record {} in {:?}: {}", index, path, e);
                None
            }
        })
        .collect())
}
