//! Final score blending and top-N selection.
//!
//! ```text
//! final_score = wp · personal + wt · popularity / max_popularity + wr · boost
//! ```
//!
//! `personal` defaults to 0 for events without an entry. One diversity draw
//! is taken per event, in input order, regardless of the weights, so the
//! random sequence consumed depends only on the number of events.

use std::cmp::Ordering;
use std::collections::HashMap;

use catalog::{Event, EventId};
use scoring::{
    DiversityInjector, RECOMMENDATION_LIMIT, RandomSource, ScoreWeights, trending_score,
};
use tracing::{debug, instrument};

/// An event with its blended score. Only used for sorting.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEvent {
    pub event: Event,
    pub score: f64,
}

/// Descending by score, ties by ascending event id.
fn by_score_desc(a: &ScoredEvent, b: &ScoredEvent) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.event.id.cmp(&b.event.id))
}

/// `weight * value`, where a zero weight switches the component off even
/// for an infinite value.
fn weighted(weight: f64, value: f64) -> f64 {
    if weight == 0.0 { 0.0 } else { weight * value }
}

/// Blends personal, trending and diversity scores and keeps the best events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingAggregator {
    diversity: DiversityInjector,
    limit: usize,
}

impl RankingAggregator {
    pub fn new(diversity: DiversityInjector) -> Self {
        Self {
            diversity,
            limit: RECOMMENDATION_LIMIT,
        }
    }

    /// Configure the number of events returned (default: 50).
    ///
    /// The limit can be lowered but never raised above 50.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(RECOMMENDATION_LIMIT);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Score every event without sorting, in input order.
    pub fn score_events(
        &self,
        events: Vec<Event>,
        personal_scores: Option<&HashMap<EventId, f64>>,
        max_popularity: u64,
        weights: ScoreWeights,
        random: &dyn RandomSource,
    ) -> Vec<ScoredEvent> {
        events
            .into_iter()
            .map(|event| {
                let personal = personal_scores
                    .and_then(|scores| scores.get(&event.id).copied())
                    .unwrap_or(0.0);
                let trending = trending_score(&event, max_popularity);
                let boost = self.diversity.boost(random);

                let score = weighted(weights.personal(), personal)
                    + weighted(weights.trending(), trending)
                    + weighted(weights.diversity(), boost);
                ScoredEvent { event, score }
            })
            .collect()
    }

    /// Score, sort descending and truncate to the limit.
    #[instrument(
        skip_all,
        fields(events = events.len(), personalized = personal_scores.is_some())
    )]
    pub fn rank(
        &self,
        events: Vec<Event>,
        personal_scores: Option<&HashMap<EventId, f64>>,
        max_popularity: u64,
        weights: ScoreWeights,
        random: &dyn RandomSource,
    ) -> Vec<Event> {
        let mut scored =
            self.score_events(events, personal_scores, max_popularity, weights, random);
        scored.sort_by(by_score_desc);
        scored.truncate(self.limit);

        debug!(
            "Ranked {} events (top score: {:?})",
            scored.len(),
            scored.first().map(|s| s.score)
        );

        scored.into_iter().map(|s| s.event).collect()
    }
}

impl Default for RankingAggregator {
    fn default() -> Self {
        Self::new(DiversityInjector::new())
    }
}
