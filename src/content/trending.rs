//! Time-decayed, interaction-weighted trending scores.
//!
//! `trendingScore = interactionScore × ageDecay × baseScore` with
//! `interactionScore = views×0.1 + likes×1.0 + bookmarks×2.0 + shares×3.0`
//! and `ageDecay = max(0.1, 1 / (1 + ageHours × 0.1))`. The constants are
//! configurable through [`TrendingWeights`] but must keep these defaults —
//! the feed UI's "trending" ordering is calibrated against them.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::{ContentItem, Interactions};

use super::{sort_ranked, RankedContent};

/// Weight constants for the trending formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingWeights {
    pub views: f64,
    pub likes: f64,
    pub bookmarks: f64,
    pub shares: f64,
    /// Per-hour decay rate.
    pub decay_rate: f64,
    /// Decay never drops below this floor.
    pub decay_floor: f64,
}

impl Default for TrendingWeights {
    fn default() -> Self {
        Self {
            views: 0.1,
            likes: 1.0,
            bookmarks: 2.0,
            shares: 3.0,
            decay_rate: 0.1,
            decay_floor: 0.1,
        }
    }
}

/// Weighted sum of interaction counts.
pub fn interaction_score(interactions: &Interactions, weights: &TrendingWeights) -> f64 {
    interactions.views as f64 * weights.views
        + interactions.likes as f64 * weights.likes
        + interactions.bookmarks as f64 * weights.bookmarks
        + interactions.shares as f64 * weights.shares
}

/// Hyperbolic age decay with a floor. `age_hours` below 0 is treated as 0.
pub fn age_decay(age_hours: f64, weights: &TrendingWeights) -> f64 {
    let age_hours = age_hours.max(0.0);
    (1.0 / (1.0 + age_hours * weights.decay_rate)).max(weights.decay_floor)
}

/// Trending score for a single item at time `now`. Never fails: a missing
/// base score is neutral (1.0) and future publication timestamps decay as
/// age 0.
pub fn trending_score(item: &ContentItem, now: DateTime<Utc>, weights: &TrendingWeights) -> f64 {
    interaction_score(&item.interactions, weights)
        * age_decay(item.age_hours(now), weights)
        * item.base_score()
}

/// Score a batch and return it ordered by trending score descending.
pub fn rank_trending(
    items: &[ContentItem],
    now: DateTime<Utc>,
    weights: &TrendingWeights,
) -> Vec<RankedContent> {
    let ranked: Vec<RankedContent> = items
        .par_iter()
        .map(|item| RankedContent {
            item: item.clone(),
            score: trending_score(item, now, weights),
        })
        .collect();
    sort_ranked(ranked)
}
