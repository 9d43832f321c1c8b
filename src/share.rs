//! Social share intents for a ranked developer.

use reqwest::Url;

use crate::error::CodeMapperError;
use crate::models::{RankedEntry, RankingCriterion, ShareLinks};

const TWITTER_INTENT_URL: &str = "https://twitter.com/intent/tweet";
const LINKEDIN_FEED_URL: &str = "https://www.linkedin.com/feed/";
const HASHTAGS: &str = "#CodeMapper #DevRanking";

/// Plain-text announcement of a developer's rank in a country.
pub fn share_message(entry: &RankedEntry, country: &str, criterion: RankingCriterion) -> String {
    format!(
        "{} is ranked #{} in {} with {} {}! {}",
        entry.record.display_name(),
        entry.rank,
        country,
        criterion.stat(&entry.record),
        criterion.label(),
        HASHTAGS
    )
}

pub fn twitter_intent_url(message: &str) -> Result<String, CodeMapperError> {
    build_url(TWITTER_INTENT_URL, &[("text", message)])
}

pub fn linkedin_share_url(message: &str) -> Result<String, CodeMapperError> {
    build_url(
        LINKEDIN_FEED_URL,
        &[("shareActive", "true"), ("text", message)],
    )
}

/// Message plus both intent URLs.
pub fn share_links(
    entry: &RankedEntry,
    country: &str,
    criterion: RankingCriterion,
) -> Result<ShareLinks, CodeMapperError> {
    let message = share_message(entry, country, criterion);
    Ok(ShareLinks {
        twitter_url: twitter_intent_url(&message)?,
        linkedin_url: linkedin_share_url(&message)?,
        message,
    })
}

fn build_url(base: &str, params: &[(&str, &str)]) -> Result<String, CodeMapperError> {
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| CodeMapperError::InvalidUrl(format!("{base}: {e}")))
}
