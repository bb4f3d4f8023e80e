//! # Scoring Crate
//!
//! The three score components a recommendation is blended from, plus the
//! injectable clock and randomness they depend on.
//!
//! ## Components
//!
//! ### Personal affinity
//! Category overlap between a candidate and the events the user liked,
//! weighted by `exp(-λ · days since the like)`.
//!
//! ### Trending
//! `(likes + views) / max popularity`, persisted per event by a batch
//! recalculation pass.
//!
//! ### Diversity
//! A flat 0.2 boost for roughly 30% of events, drawn from a `RandomSource`.
//!
//! ## Example Usage
//!
//! ```ignore
//! use scoring::{group_categories, PersonalAffinityScorer, SystemClock, Clock};
//!
//! let categories = group_categories(&index.categories_for_events(&ids)?);
//! let likes = index.like_entries("test_user1")?;
//!
//! let scores = PersonalAffinityScorer::new()
//!     .score(&likes, &candidates, &categories, SystemClock.now());
//! ```

pub mod affinity;
pub mod clock;
pub mod diversity;
pub mod trending;
pub mod weights;

/// Maximum number of events any ranking returns
pub const RECOMMENDATION_LIMIT: usize = 50;

pub use affinity::{DEFAULT_DECAY_LAMBDA, PersonalAffinityScorer, group_categories};
pub use clock::{Clock, FixedClock, SystemClock};
pub use diversity::{
    DEFAULT_DIVERSITY_BOOST, DEFAULT_DIVERSITY_PROBABILITY, DiversityInjector, RandomSource,
    SeededRandom, ThreadRandom,
};
pub use trending::{TrendingScorer, by_trending_desc, max_popularity, trending_score};
pub use weights::{ScoreWeights, WeightsError};

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Event, EventCategory, LikeEntry};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_scorers_share_clock_instant() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 4, 16, 12, 0, 0).unwrap());
        let now = clock.now();

        let candidate = Event::new(2, "Gallery Walk", now + Duration::days(1)).with_counts(3, 1);
        let rows: Vec<EventCategory> = [1, 2]
            .into_iter()
            .map(|event_id| EventCategory {
                event_id,
                category: "art".to_string(),
            })
            .collect();
        let likes = vec![LikeEntry {
            event_id: 1,
            timestamp: now,
        }];

        let personal = PersonalAffinityScorer::new().score(
            &likes,
            std::slice::from_ref(&candidate),
            &group_categories(&rows),
            now,
        );
        assert_eq!(personal[&2], 1.0);

        let max = max_popularity(std::slice::from_ref(&candidate));
        assert_eq!(trending_score(&candidate, max), 1.0);
    }
}
