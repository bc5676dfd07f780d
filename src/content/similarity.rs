//! Content similarity: external semantic ranking with a tag-overlap
//! fallback.
//!
//! The external similarity capability is treated as fallible; when it is
//! unavailable the engine degrades to a Jaccard index over lowercased tag
//! sets rather than failing the request.

use std::collections::HashSet;

use crate::capability::SimilarityRanker;
use crate::model::ContentItem;

use super::{sort_ranked, RankedContent};

/// Jaccard index over lowercased tag sets.
///
/// Defined as 0 when both sets are empty (0/0 = 0, not NaN).
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    let a: HashSet<String> = a.iter().map(|t| t.to_lowercase()).collect();
    let b: HashSet<String> = b.iter().map(|t| t.to_lowercase()).collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Rank `candidates` by similarity to `item`, most similar first.
///
/// Asks the external ranker when one is available; on failure logs a
/// warning and falls back to tag Jaccard. Candidates unknown to the ranker
/// response score 0.
pub fn rank_similar(
    ranker: Option<&dyn SimilarityRanker>,
    item: &ContentItem,
    candidates: &[ContentItem],
    top_k: usize,
) -> Vec<RankedContent> {
    if let Some(ranker) = ranker {
        let query = item.full_text();
        let documents: Vec<(String, String)> = candidates
            .iter()
            .map(|c| (c.id.clone(), c.full_text()))
            .collect();
        match ranker.rank(&query, &documents) {
            Ok(scored) => {
                let mut ranked: Vec<RankedContent> = candidates
                    .iter()
                    .map(|c| RankedContent {
                        item: c.clone(),
                        score: scored
                            .iter()
                            .find(|r| r.id == c.id)
                            .map(|r| r.score)
                            .unwrap_or(0.0),
                    })
                    .collect();
                ranked = sort_ranked(ranked);
                ranked.truncate(top_k);
                return ranked;
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    item = %item.id,
                    "similarity capability failed, falling back to tag overlap"
                );
            }
        }
    }

    let mut ranked: Vec<RankedContent> = candidates
        .iter()
        .map(|c| RankedContent {
            item: c.clone(),
            score: jaccard(&item.tags, &c.tags),
        })
        .collect();
    ranked = sort_ranked(ranked);
    ranked.truncate(top_k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{RankedCandidate, SimilarityRanker};
    use crate::error::CapabilityError;
    use chrono::Utc;

    fn tags(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn jaccard_of_two_empty_sets_is_zero() {
        assert_eq!(jaccard(&[], &[]), 0.0);
    }

    #[test]
    fn jaccard_of_identical_nonempty_sets_is_one() {
        let a = tags(&["rust", "systems"]);
        assert!((jaccard(&a, &a) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_is_symmetric() {
        let a = tags(&["rust", "systems", "compilers"]);
        let b = tags(&["rust", "web"]);
        assert!((jaccard(&a, &b) - jaccard(&b, &a)).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_is_case_insensitive() {
        let a = tags(&["Rust", "AI"]);
        let b = tags(&["rust", "ai"]);
        assert!((jaccard(&a, &b) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn jaccard_partial_overlap() {
        let a = tags(&["rust", "ai"]);
        let b = tags(&["rust", "web", "ai", "cloud"]);
        // intersection 2, union 4
        assert!((jaccard(&a, &b) - 0.5).abs() < f64::EPSILON);
    }

    struct BrokenRanker;
    impl SimilarityRanker for BrokenRanker {
        fn rank(
            &self,
            _query: &str,
            _candidates: &[(String, String)],
        ) -> Result<Vec<RankedCandidate>, CapabilityError> {
            Err(CapabilityError::ServiceUnavailable {
                service: "similarity".into(),
                message: "connection refused".into(),
            })
        }
    }

    struct FixedRanker;
    impl SimilarityRanker for FixedRanker {
        fn rank(
            &self,
            _query: &str,
            candidates: &[(String, String)],
        ) -> Result<Vec<RankedCandidate>, CapabilityError> {
            // Reverse input order with descending scores.
            Ok(candidates
                .iter()
                .rev()
                .enumerate()
                .map(|(i, (id, _))| RankedCandidate {
                    id: id.clone(),
                    score: 1.0 - i as f64 * 0.1,
                })
                .collect())
        }
    }

    fn item(id: &str, item_tags: &[&str]) -> ContentItem {
        ContentItem::new(id, Utc::now()).with_tags(item_tags.iter().copied())
    }

    #[test]
    fn unavailable_ranker_falls_back_to_tags() {
        let query = item("q", &["rust", "ai"]);
        let candidates = vec![
            item("far", &["cooking"]),
            item("near", &["rust", "ai"]),
            item("mid", &["rust"]),
        ];
        let ranked = rank_similar(Some(&BrokenRanker), &query, &candidates, 3);
        assert_eq!(ranked[0].item.id, "near");
        assert_eq!(ranked[1].item.id, "mid");
        assert_eq!(ranked[2].item.id, "far");
    }

    #[test]
    fn ranker_scores_take_precedence_over_tags() {
        let query = item("q", &["rust"]);
        let candidates = vec![item("a", &["rust"]), item("b", &["cooking"])];
        let ranked = rank_similar(Some(&FixedRanker), &query, &candidates, 2);
        // FixedRanker reverses: "b" outranks "a" despite tag overlap.
        assert_eq!(ranked[0].item.id, "b");
    }

    #[test]
    fn top_k_truncates() {
        let query = item("q", &["rust"]);
        let candidates = vec![
            item("a", &["rust"]),
            item("b", &["rust"]),
            item("c", &["rust"]),
        ];
        let ranked = rank_similar(None, &query, &candidates, 2);
        assert_eq!(ranked.len(), 2);
    }
}
