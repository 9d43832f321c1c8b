//! Data models for developer leaderboards and map hotspots.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::CodeMapperError;

/// Placeholder the data exporter writes for missing string fields.
pub const UNDEFINED_SENTINEL: &str = "undefined value";

/// One contributor profile, as stored in a country's cache file.
///
/// Missing strings (including the exporter's sentinel) become `None` and
/// malformed counts become 0, so every record that has a login can be ranked.
/// A precomputed `totalContributions` in the file is ignored; see
/// [`DeveloperRecord::total_contributions`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperRecord {
    #[serde(deserialize_with = "login_string")]
    pub login: String,
    #[serde(default, deserialize_with = "sentinel_as_none", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "sentinel_as_none", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "sentinel_as_none", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "sentinel_as_none", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "sentinel_as_none", skip_serializing_if = "Option::is_none")]
    pub twitter_username: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub public_contributions: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub private_contributions: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub followers: u64,
}

impl DeveloperRecord {
    /// Name to show for this developer, falling back to the login.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.login)
    }

    /// Public plus private contributions, always derived.
    pub fn total_contributions(&self) -> u64 {
        self.public_contributions
            .saturating_add(self.private_contributions)
    }
}

/// Logins are strings, but some exports write purely numeric handles as numbers.
fn login_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "login must be a non-empty string, got {other}"
        ))),
    }
}

fn sentinel_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match opt {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == UNDEFINED_SENTINEL {
                None
            } else {
                Some(s)
            }
        }
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<Value> = Option::deserialize(deserializer)?;
    Ok(opt.as_ref().map_or(0, count_from_value))
}

/// Coerces a JSON value into a non-negative count. Anything that is not a
/// usable number counts as 0.
fn count_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(float_to_count))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_count))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn float_to_count(f: f64) -> Option<u64> {
    // `as` saturates at u64::MAX for huge values.
    (f.is_finite() && f > 0.0).then(|| f.trunc() as u64)
}

/// The statistic developers are ordered by.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RankingCriterion {
    #[default]
    #[serde(rename = "public")]
    PublicContributions,
    #[serde(rename = "total")]
    TotalContributions,
    #[serde(rename = "followers")]
    Followers,
}

impl RankingCriterion {
    pub const ALL: [RankingCriterion; 3] = [
        RankingCriterion::PublicContributions,
        RankingCriterion::TotalContributions,
        RankingCriterion::Followers,
    ];

    /// Key used in query strings and filter tabs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PublicContributions => "public",
            Self::TotalContributions => "total",
            Self::Followers => "followers",
        }
    }

    /// Human-readable label shown next to the stat value.
    pub fn label(self) -> &'static str {
        match self {
            Self::PublicContributions => "Public Contributions",
            Self::TotalContributions => "Total Contributions",
            Self::Followers => "Followers",
        }
    }

    /// The sort key for `record` under this criterion.
    pub fn stat(self, record: &DeveloperRecord) -> u64 {
        match self {
            Self::PublicContributions => record.public_contributions,
            Self::TotalContributions => record.total_contributions(),
            Self::Followers => record.followers,
        }
    }
}

impl fmt::Display for RankingCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingCriterion {
    type Err = CodeMapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::PublicContributions),
            "total" => Ok(Self::TotalContributions),
            "followers" => Ok(Self::Followers),
            other => Err(CodeMapperError::InvalidCriterion(other.to_string())),
        }
    }
}

/// A developer together with their 1-based position in the full ranking.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub record: DeveloperRecord,
    pub rank: usize,
}

/// A clickable rectangle on the map, in map-pixel coordinates.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HotspotRegion {
    pub country_name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A country available in the cache directory.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CountrySummary {
    pub name: String,
    /// ISO code; the cache files do not carry one, so this is usually empty.
    pub code: String,
    pub region: Option<HotspotRegion>,
}

/// Display-ready row of a leaderboard. Sentinel and missing values are
/// already resolved, so templates and clients can print fields directly.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub login: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub twitter_username: Option<String>,
    pub stat_value: u64,
    pub stat_label: &'static str,
    pub public_contributions: u64,
    pub total_contributions: u64,
    pub followers: u64,
}

impl LeaderboardEntry {
    pub fn from_ranked(entry: &RankedEntry, criterion: RankingCriterion) -> Self {
        let record = &entry.record;
        Self {
            rank: entry.rank,
            login: record.login.clone(),
            display_name: record.display_name().to_string(),
            avatar_url: record.avatar_url.clone(),
            company: record.company.clone(),
            location: record.location.clone(),
            twitter_username: record.twitter_username.clone(),
            stat_value: criterion.stat(record),
            stat_label: criterion.label(),
            public_contributions: record.public_contributions,
            total_contributions: record.total_contributions(),
            followers: record.followers,
        }
    }
}

/// Leaderboard for one country as served to the panel, modal and card views.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardView {
    pub country: String,
    pub criterion: RankingCriterion,
    pub criterion_label: &'static str,
    pub query: Option<String>,
    pub total_developers: usize,
    pub entries: Vec<LeaderboardEntry>,
}

/// `{"data": [...]}` envelope used by the bulk API routes.
#[derive(Debug, Serialize, Clone)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

/// Every developer of one country, unranked, as stored in its cache file.
#[derive(Debug, Serialize, Clone)]
pub struct CountryDevelopers {
    pub country: String,
    pub developers: Vec<DeveloperRecord>,
}

/// Share text plus ready-to-open intent URLs for one ranked developer.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinks {
    pub message: String,
    pub twitter_url: String,
    pub linkedin_url: String,
}
