//! Personal Affinity Scoring
//!
//! Scores candidate events by how well their categories overlap with the
//! categories of events the user liked, favouring recent likes.
//!
//! ## Algorithm
//! 1. For each like, `days = whole days since the like` and
//!    `decay = exp(-λ · days)` (λ = 0.05 by default)
//! 2. Split `decay` evenly across the liked event's categories and accumulate
//!    per category label
//! 3. A candidate's score is the mean weight over those of its categories that
//!    appear in the weight map
//!
//! Likes of uncategorized events contribute nothing. Candidates sharing no
//! category with the history get no entry at all.

use std::collections::HashMap;

use catalog::{CategoryLabel, Event, EventCategory, EventId, LikeEntry};
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

/// Default decay rate per day
pub const DEFAULT_DECAY_LAMBDA: f64 = 0.05;

/// Group flat (event, category) rows by event.
///
/// Labels keep their first-seen order; a label repeated for the same event is
/// kept once.
pub fn group_categories(rows: &[EventCategory]) -> HashMap<EventId, Vec<CategoryLabel>> {
    let mut grouped: HashMap<EventId, Vec<CategoryLabel>> = HashMap::new();
    for row in rows {
        let labels = grouped.entry(row.event_id).or_default();
        if !labels.contains(&row.category) {
            labels.push(row.category.clone());
        }
    }
    grouped
}

/// Turns a like history into per-event personal scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonalAffinityScorer {
    decay_lambda: f64,
    clamp_future_likes: bool,
}

impl PersonalAffinityScorer {
    pub fn new() -> Self {
        Self {
            decay_lambda: DEFAULT_DECAY_LAMBDA,
            clamp_future_likes: false,
        }
    }

    /// Configure the decay rate per day (default: 0.05)
    pub fn with_decay_lambda(mut self, decay_lambda: f64) -> Self {
        self.decay_lambda = decay_lambda;
        self
    }

    /// Treat likes timestamped after `now` as made today (default: false)
    pub fn with_clamp_future_likes(mut self, clamp: bool) -> Self {
        self.clamp_future_likes = clamp;
        self
    }

    /// Whole days elapsed since `liked_at`, truncated toward zero.
    ///
    /// Negative for future-dated likes unless clamping is enabled.
    pub fn days_since(&self, liked_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let days = (now - liked_at).num_days();
        if self.clamp_future_likes {
            days.max(0)
        } else {
            days
        }
    }

    /// `exp(-λ · days)`
    pub fn decay_weight(&self, days: i64) -> f64 {
        (-self.decay_lambda * days as f64).exp()
    }

    /// Build the category weight map from scratch.
    pub fn category_weights(
        &self,
        likes: &[LikeEntry],
        categories: &HashMap<EventId, Vec<CategoryLabel>>,
        now: DateTime<Utc>,
    ) -> HashMap<CategoryLabel, f64> {
        let mut weights: HashMap<CategoryLabel, f64> = HashMap::new();

        for like in likes {
            let Some(labels) = categories.get(&like.event_id).filter(|l| !l.is_empty()) else {
                continue;
            };

            let decay = self.decay_weight(self.days_since(like.timestamp, now));
            let share = decay / labels.len() as f64;
            for label in labels {
                *weights.entry(label.clone()).or_insert(0.0) += share;
            }
        }

        weights
    }

    /// Personal score per candidate.
    ///
    /// # Arguments
    /// * `likes` - The user's like history
    /// * `candidates` - Events to score
    /// * `categories` - Category labels of candidates and liked events
    /// * `now` - Instant decay is measured against
    #[instrument(skip_all, fields(likes = likes.len(), candidates = candidates.len()))]
    pub fn score(
        &self,
        likes: &[LikeEntry],
        candidates: &[Event],
        categories: &HashMap<EventId, Vec<CategoryLabel>>,
        now: DateTime<Utc>,
    ) -> HashMap<EventId, f64> {
        let weights = self.category_weights(likes, categories, now);
        debug!("Built weights for {} categories", weights.len());

        let scores: HashMap<EventId, f64> = candidates
            .iter()
            .filter_map(|event| {
                let labels = categories.get(&event.id)?;
                let matched: Vec<f64> = labels
                    .iter()
                    .filter_map(|label| weights.get(label).copied())
                    .collect();

                if matched.is_empty() {
                    return None;
                }
                let mean = matched.iter().sum::<f64>() / matched.len() as f64;
                Some((event.id, mean))
            })
            .collect();

        debug!("Scored {} of {} candidates", scores.len(), candidates.len());
        scores
    }
}

impl Default for PersonalAffinityScorer {
    fn default() -> Self {
        Self::new()
    }
}
