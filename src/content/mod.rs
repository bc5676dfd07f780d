//! Content scoring: trending, similarity, composite feed relevance,
//! quality filtering, and recommendations.
//!
//! All scores here are derived and ephemeral — computed per request from a
//! [`crate::model::ContentItem`] batch and never persisted. Scoring never
//! fails: missing inputs fall back to safe defaults.

pub mod filter;
pub mod recommend;
pub mod relevance;
pub mod similarity;
pub mod trending;

use serde::Serialize;

use crate::model::ContentItem;

/// A content item paired with a derived score, sorted descending by every
/// ranking entry point in this module.
#[derive(Debug, Clone, Serialize)]
pub struct RankedContent {
    pub item: ContentItem,
    pub score: f64,
}

/// Sort (item, score) pairs descending by score, breaking ties by item id
/// for deterministic output.
pub(crate) fn sort_ranked(mut ranked: Vec<RankedContent>) -> Vec<RankedContent> {
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.item.id.cmp(&b.item.id))
    });
    ranked
}
