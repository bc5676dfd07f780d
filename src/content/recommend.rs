//! Interest-based recommendations derived from interaction history.
//!
//! Interests are the tags of the items a user has already engaged with;
//! candidates are scored by tag and source overlap with that history.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{sort_ranked, RankedContent};
use crate::model::ContentItem;

/// Weights for the recommendation score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Score every candidate starts from.
    pub base: f64,
    /// Added when a candidate shares at least one tag with the history.
    pub interest_bonus: f64,
    /// Added when a candidate's source appears in the history.
    pub source_bonus: f64,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            base: 0.5,
            interest_bonus: 0.3,
            source_bonus: 0.2,
        }
    }
}

/// Distinct lowercased tags across the history items.
pub fn derive_interests(history: &[ContentItem]) -> HashSet<String> {
    history
        .iter()
        .flat_map(|item| item.tags.iter())
        .map(|tag| tag.to_lowercase())
        .collect()
}

fn derive_sources(history: &[ContentItem]) -> HashSet<String> {
    history
        .iter()
        .filter_map(|item| item.source.as_ref())
        .map(|source| source.to_lowercase())
        .collect()
}

/// Score candidates against a user's history and return the top `limit`,
/// highest first. Candidates already present in the history are skipped.
pub fn recommend(
    history: &[ContentItem],
    candidates: &[ContentItem],
    limit: usize,
    config: &RecommendConfig,
) -> Vec<RankedContent> {
    let interests = derive_interests(history);
    let sources = derive_sources(history);
    let seen: HashSet<&str> = history.iter().map(|item| item.id.as_str()).collect();

    let ranked: Vec<RankedContent> = candidates
        .iter()
        .filter(|item| !seen.contains(item.id.as_str()))
        .map(|item| {
            let mut score = config.base;
            if item
                .tags
                .iter()
                .any(|tag| interests.contains(&tag.to_lowercase()))
            {
                score += config.interest_bonus;
            }
            if item
                .source
                .as_ref()
                .is_some_and(|source| sources.contains(&source.to_lowercase()))
            {
                score += config.source_bonus;
            }
            RankedContent {
                item: item.clone(),
                score,
            }
        })
        .collect();

    let mut ranked = sort_ranked(ranked);
    ranked.truncate(limit);
    ranked
}
