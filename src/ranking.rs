//! Developer ranking shared by every leaderboard surface.
//!
//! All functions here are pure: they read the caller's records, never
//! reorder them in place, and return freshly allocated entries. A developer's
//! rank always refers to the complete country list for the chosen criterion,
//! including when only a searched subset is returned.

use itertools::Itertools;
use std::cmp::Reverse;

use crate::models::{DeveloperRecord, RankedEntry, RankingCriterion};

/// Orders `developers` by `criterion`, highest first, and numbers them from 1.
///
/// The sort is stable, so developers with equal stats keep their input order
/// and the same input always produces the same ranks.
pub fn rank(developers: &[DeveloperRecord], criterion: RankingCriterion) -> Vec<RankedEntry> {
    developers
        .iter()
        .sorted_by_key(|dev| Reverse(criterion.stat(dev)))
        .enumerate()
        .map(|(index, dev)| RankedEntry {
            record: dev.clone(),
            rank: index + 1,
        })
        .collect()
}

/// The first `k` entries of an already ranked list (fewer if it is shorter).
pub fn top_k(ranked: &[RankedEntry], k: usize) -> Vec<RankedEntry> {
    ranked.iter().take(k).cloned().collect()
}

/// Ranks the full list, then keeps the entries matching `query`.
///
/// Matching is a case-insensitive substring test against the name, login,
/// location and company. Returned entries keep their rank from the full
/// ranking. An empty query matches everyone; callers wanting the "top K"
/// view for a blank search use [`leaderboard`].
pub fn search_filtered(
    developers: &[DeveloperRecord],
    criterion: RankingCriterion,
    query: &str,
) -> Vec<RankedEntry> {
    let needle = query.to_lowercase();
    rank(developers, criterion)
        .into_iter()
        .filter(|entry| matches_query(&entry.record, &needle))
        .collect()
}

/// Presentation rule used by the panel, modal and API: a blank query shows
/// the top `k`, anything else shows every match with its global rank.
pub fn leaderboard(
    developers: &[DeveloperRecord],
    criterion: RankingCriterion,
    query: Option<&str>,
    k: usize,
) -> Vec<RankedEntry> {
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => search_filtered(developers, criterion, q),
        None => top_k(&rank(developers, criterion), k),
    }
}

/// Looks up one developer's ranked entry by login (case-insensitive).
pub fn find_ranked(
    developers: &[DeveloperRecord],
    criterion: RankingCriterion,
    login: &str,
) -> Option<RankedEntry> {
    rank(developers, criterion)
        .into_iter()
        .find(|entry| entry.record.login.eq_ignore_ascii_case(login))
}

/// `needle` must already be lowercased.
fn matches_query(dev: &DeveloperRecord, needle: &str) -> bool {
    [
        dev.name.as_deref(),
        Some(dev.login.as_str()),
        dev.location.as_deref(),
        dev.company.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dev(login: &str, public: u64, private: u64, followers: u64) -> DeveloperRecord {
        DeveloperRecord {
            login: login.to_string(),
            public_contributions: public,
            private_contributions: private,
            followers,
            ..Default::default()
        }
    }

    fn sample() -> Vec<DeveloperRecord> {
        vec![dev("a", 10, 5, 2), dev("b", 20, 0, 50)]
    }

    fn logins_and_ranks(entries: &[RankedEntry]) -> Vec<(&str, usize)> {
        entries
            .iter()
            .map(|e| (e.record.login.as_str(), e.rank))
            .collect()
    }

    mod rank_tests {
        use super::*;

        #[test]
        fn test_public_contributions() {
            let ranked = rank(&sample(), RankingCriterion::PublicContributions);
            assert_eq!(logins_and_ranks(&ranked), vec![("b", 1), ("a", 2)]);
            assert_eq!(ranked[0].record.public_contributions, 20);
        }

        #[test]
        fn test_followers() {
            let ranked = rank(&sample(), RankingCriterion::Followers);
            assert_eq!(logins_and_ranks(&ranked), vec![("b", 1), ("a", 2)]);
            assert_eq!(ranked[1].record.followers, 2);
        }

        #[test]
        fn test_total_contributions_is_computed() {
            let ranked = rank(&sample(), RankingCriterion::TotalContributions);
            assert_eq!(logins_and_ranks(&ranked), vec![("b", 1), ("a", 2)]);
            assert_eq!(ranked[0].record.total_contributions(), 20);
            assert_eq!(ranked[1].record.total_contributions(), 15);
        }

        #[test]
        fn test_private_contributions_can_change_order() {
            let devs = vec![dev("pub", 100, 0, 0), dev("priv", 50, 80, 0)];
            let ranked = rank(&devs, RankingCriterion::TotalContributions);
            assert_eq!(logins_and_ranks(&ranked), vec![("priv", 1), ("pub", 2)]);
        }

        #[test]
        fn test_empty_input() {
            assert!(rank(&[], RankingCriterion::Followers).is_empty());
        }

        #[test]
        fn test_ties_keep_input_order() {
            let devs = vec![dev("x", 5, 0, 1), dev("y", 9, 0, 1), dev("z", 5, 0, 1)];
            let ranked = rank(&devs, RankingCriterion::PublicContributions);
            assert_eq!(logins_and_ranks(&ranked), vec![("y", 1), ("x", 2), ("z", 3)]);
            let ranked = rank(&devs, RankingCriterion::Followers);
            assert_eq!(logins_and_ranks(&ranked), vec![("x", 1), ("y", 2), ("z", 3)]);
        }

        #[test]
        fn test_input_not_mutated() {
            let devs = sample();
            let before = devs.clone();
            let _ = rank(&devs, RankingCriterion::PublicContributions);
            assert_eq!(devs, before);
        }
    }

    mod top_k_tests {
        use super::*;

        #[test]
        fn test_takes_first_k() {
            let devs: Vec<_> = (0..8).map(|i| dev(&format!("d{i}"), i, 0, 0)).collect();
            let ranked = rank(&devs, RankingCriterion::PublicContributions);
            let top = top_k(&ranked, 5);
            assert_eq!(top.len(), 5);
            assert_eq!(top[0].record.login, "d7");
            assert_eq!(top[4].rank, 5);
        }

        #[test]
        fn test_shorter_input() {
            let ranked = rank(&sample(), RankingCriterion::Followers);
            assert_eq!(top_k(&ranked, 5).len(), 2);
            assert!(top_k(&ranked, 0).is_empty());
        }
    }

    mod search_tests {
        use super::*;

        #[test]
        fn test_search_keeps_global_rank() {
            let found = search_filtered(&sample(), RankingCriterion::PublicContributions, "a");
            assert_eq!(logins_and_ranks(&found), vec![("a", 2)]);
        }

        #[test]
        fn test_search_is_case_insensitive_across_fields() {
            let mut devs = sample();
            devs[0].name = Some("Ada Lovelace".into());
            devs[1].location = Some("Oran, Algeria".into());
            devs[1].company = Some("OranCode".into());

            let by_name = search_filtered(&devs, RankingCriterion::Followers, "LOVELACE");
            assert_eq!(logins_and_ranks(&by_name), vec![("a", 2)]);

            let by_location = search_filtered(&devs, RankingCriterion::Followers, "algeria");
            assert_eq!(logins_and_ranks(&by_location), vec![("b", 1)]);

            let by_company = search_filtered(&devs, RankingCriterion::Followers, "orancode");
            assert_eq!(logins_and_ranks(&by_company), vec![("b", 1)]);
        }

        #[test]
        fn test_missing_fields_do_not_match() {
            let json = r#"{"login":"zed","name":"undefined value","company":"undefined value"}"#;
            let devs = vec![serde_json::from_str::<DeveloperRecord>(json).unwrap()];
            assert!(search_filtered(&devs, RankingCriterion::Followers, "undefined").is_empty());
        }

        #[test]
        fn test_no_matches_is_empty() {
            assert!(search_filtered(&sample(), RankingCriterion::Followers, "nobody").is_empty());
        }

        #[test]
        fn test_empty_query_matches_all() {
            assert_eq!(search_filtered(&sample(), RankingCriterion::Followers, "").len(), 2);
        }
    }

    mod leaderboard_tests {
        use super::*;

        #[test]
        fn test_blank_query_shows_top_k() {
            let devs: Vec<_> = (0..8).map(|i| dev(&format!("d{i}"), i, 0, 0)).collect();
            let view = leaderboard(&devs, RankingCriterion::PublicContributions, Some("  "), 5);
            assert_eq!(view.len(), 5);
            let view = leaderboard(&devs, RankingCriterion::PublicContributions, None, 3);
            assert_eq!(view.len(), 3);
        }

        #[test]
        fn test_query_is_not_truncated_to_k() {
            let devs: Vec<_> = (0..8).map(|i| dev(&format!("d{i}"), i, 0, 0)).collect();
            let view = leaderboard(&devs, RankingCriterion::PublicContributions, Some("d"), 5);
            assert_eq!(view.len(), 8);
        }

        #[test]
        fn test_find_ranked() {
            let found = find_ranked(&sample(), RankingCriterion::Followers, "A").unwrap();
            assert_eq!(found.rank, 2);
            assert!(find_ranked(&sample(), RankingCriterion::Followers, "c").is_none());
        }
    }

    fn arb_developers() -> impl Strategy<Value = Vec<DeveloperRecord>> {
        prop::collection::vec((0u64..20, 0u64..20, 0u64..20), 0..40).prop_map(|stats| {
            stats
                .into_iter()
                .enumerate()
                .map(|(i, (p, q, f))| dev(&format!("dev{i}"), p, q, f))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_ranks_are_contiguous(devs in arb_developers()) {
            for criterion in RankingCriterion::ALL {
                let ranked = rank(&devs, criterion);
                prop_assert_eq!(ranked.len(), devs.len());
                for (index, entry) in ranked.iter().enumerate() {
                    prop_assert_eq!(entry.rank, index + 1);
                }
                let mut logins: Vec<_> = ranked.iter().map(|e| e.record.login.clone()).collect();
                logins.sort();
                logins.dedup();
                prop_assert_eq!(logins.len(), devs.len());
            }
        }

        #[test]
        fn prop_order_is_descending_and_stable(devs in arb_developers()) {
            for criterion in RankingCriterion::ALL {
                let ranked = rank(&devs, criterion);
                for pair in ranked.windows(2) {
                    let (a, b) = (&pair[0].record, &pair[1].record);
                    prop_assert!(criterion.stat(a) >= criterion.stat(b));
                    if criterion.stat(a) == criterion.stat(b) {
                        let pos = |d: &DeveloperRecord| devs.iter().position(|x| x.login == d.login);
                        prop_assert!(pos(a) < pos(b));
                    }
                }
            }
        }

        #[test]
        fn prop_search_never_renumbers(devs in arb_developers(), query in "[0-9]{1,2}") {
            for criterion in RankingCriterion::ALL {
                let full = rank(&devs, criterion);
                for entry in search_filtered(&devs, criterion, &query) {
                    let canonical = full.iter().find(|e| e.record.login == entry.record.login);
                    prop_assert_eq!(canonical.map(|e| e.rank), Some(entry.rank));
                }
            }
        }
    }
}
