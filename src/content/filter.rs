//! Keyword-heuristic content quality filtering.
//!
//! Scores every item on a 0–100 scale from keyword and source signals,
//! then keeps items at or above the configured strength threshold. This is
//! the engine-side stand-in used when the external model-backed filter is
//! not deployed; the feed treats both identically.

use std::collections::BTreeMap;

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::ContentItem;

/// Configuration for the quality filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Items scoring below this threshold are dropped.
    pub strength: f64,
    /// Starting score before keyword/source adjustments.
    pub base_score: f64,
    /// Added per boost keyword found in the item text.
    pub boost: f64,
    /// Subtracted per penalty keyword found in the item text.
    pub penalty: f64,
    pub boost_keywords: Vec<String>,
    pub penalty_keywords: Vec<String>,
    /// Flat per-source adjustment, keyed by source name.
    pub source_adjustments: BTreeMap<String, f64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let mut source_adjustments = BTreeMap::new();
        source_adjustments.insert("hackernews".to_string(), 5.0);
        source_adjustments.insert("reddit".to_string(), -2.0);
        Self {
            strength: 80.0,
            base_score: 75.0,
            boost: 10.0,
            penalty: 15.0,
            boost_keywords: [
                "technology",
                "science",
                "research",
                "ai",
                "programming",
                "innovation",
                "education",
            ]
            .map(String::from)
            .to_vec(),
            penalty_keywords: [
                "celebrity",
                "gossip",
                "clickbait",
                "trending",
                "viral",
                "drama",
            ]
            .map(String::from)
            .to_vec(),
            source_adjustments,
        }
    }
}

/// Result of filtering a batch: the surviving items and the score of every
/// processed item (kept or dropped).
#[derive(Debug, Clone, Serialize)]
pub struct FilterOutcome {
    pub kept: Vec<ContentItem>,
    pub scores: BTreeMap<String, f64>,
    pub total_processed: usize,
}

/// Whole-word match; bare substrings would let short keywords like "ai"
/// fire inside "daily" or "said".
fn contains_keyword(text: &str, keyword: &str) -> bool {
    Regex::new(&format!(r"\b{}\b", regex::escape(keyword)))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Quality score for one item, clamped to [0, 100].
pub fn quality_score(item: &ContentItem, config: &FilterConfig) -> f64 {
    let text = item.full_text().to_lowercase();
    let mut score = config.base_score;

    for keyword in &config.boost_keywords {
        if contains_keyword(&text, keyword) {
            score += config.boost;
        }
    }
    for keyword in &config.penalty_keywords {
        if contains_keyword(&text, keyword) {
            score -= config.penalty;
        }
    }
    if let Some(source) = &item.source {
        if let Some(adjustment) = config.source_adjustments.get(source) {
            score += adjustment;
        }
    }
    score.clamp(0.0, 100.0)
}

/// Score a batch in parallel and keep items at or above the strength
/// threshold. Input order is preserved among kept items.
pub fn filter_items(items: &[ContentItem], config: &FilterConfig) -> FilterOutcome {
    let scored: Vec<(ContentItem, f64)> = items
        .par_iter()
        .map(|item| (item.clone(), quality_score(item, config)))
        .collect();

    let scores: BTreeMap<String, f64> = scored
        .iter()
        .map(|(item, score)| (item.id.clone(), *score))
        .collect();
    let kept: Vec<ContentItem> = scored
        .into_iter()
        .filter(|(_, score)| *score >= config.strength)
        .map(|(item, _)| item)
        .collect();

    FilterOutcome {
        kept,
        scores,
        total_processed: items.len(),
    }
}
