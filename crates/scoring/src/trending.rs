//! Trending Scoring
//!
//! Popularity is `liked_count + viewed_count`. The trending score normalizes
//! it against the most popular event, giving a value in [0, 1]:
//!
//! ```text
//! trending_score = popularity / max(max_popularity, 1)
//! ```
//!
//! Recalculation is a full batch pass that persists every score through the
//! catalog; there is no incremental update.

use std::cmp::Ordering;

use catalog::{Event, EventCatalog};
use tracing::{debug, info, instrument};

use crate::RECOMMENDATION_LIMIT;

/// Highest popularity among `events`, floored to 1.
///
/// The floor keeps every normalized score finite when all counters are zero
/// or there are no events.
pub fn max_popularity(events: &[Event]) -> u64 {
    events
        .iter()
        .map(Event::popularity)
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Normalized popularity of one event.
pub fn trending_score(event: &Event, max_popularity: u64) -> f64 {
    event.popularity() as f64 / max_popularity.max(1) as f64
}

/// Descending by trending score, ties by ascending id.
pub fn by_trending_desc(a: &Event, b: &Event) -> Ordering {
    b.trending_score
        .total_cmp(&a.trending_score)
        .then_with(|| a.id.cmp(&b.id))
}

/// Computes, persists and ranks by trending scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingScorer {
    limit: usize,
}

impl TrendingScorer {
    pub fn new() -> Self {
        Self {
            limit: RECOMMENDATION_LIMIT,
        }
    }

    /// Configure the number of events `fetch` returns (default: 50, also the
    /// upper bound)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(RECOMMENDATION_LIMIT);
        self
    }

    /// Score every event in `events` and persist the result.
    ///
    /// Returns the number of events updated. The pass stops at the first
    /// persistence failure; scores written before it stay written.
    #[instrument(skip_all, fields(events = events.len()))]
    pub fn recalculate(
        &self,
        store: &dyn EventCatalog,
        events: &[Event],
    ) -> catalog::Result<usize> {
        let max = max_popularity(events);
        debug!("Max popularity: {}", max);

        for event in events {
            store.persist_trending_score(event.id, trending_score(event, max))?;
        }

        info!("Recalculated trending scores for {} events", events.len());
        Ok(events.len())
    }

    /// Sort by stored trending score (descending) and keep the top `limit`.
    pub fn fetch(&self, mut events: Vec<Event>) -> Vec<Event> {
        events.sort_by(by_trending_desc);
        events.truncate(self.limit);
        events
    }
}

impl Default for TrendingScorer {
    fn default() -> Self {
        Self::new()
    }
}
