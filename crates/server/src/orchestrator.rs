//! # Recommendation Orchestrator
//!
//! This module coordinates one recommendation request:
//! 1. Fetch candidate events matching the filter
//! 2. Drop events that have already started
//! 3. Resolve the user (unknown user: empty result)
//! 4. No likes: cold start ranking (trending + diversity)
//! 5. Otherwise batch-fetch categories for candidates and liked events
//! 6. Compute personal affinity scores
//! 7. Rank with the personalized weights and return the top N
//!
//! Every stage runs synchronously on the caller's thread. The orchestrator is
//! cheap to clone and `Send + Sync`, so callers may share it across threads.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use catalog::{
    CategoryIndex, CategoryLabel, Event, EventCatalog, EventFilter, EventId, EventIndex,
    LikeEntry, LikeHistoryStore,
};
use pipeline::filters::FutureEventsFilter;
use pipeline::{FilterContext, FilterPipeline, RankingAggregator};
use scoring::{
    Clock, DiversityInjector, PersonalAffinityScorer, RandomSource, ScoreWeights, SeededRandom,
    SystemClock, ThreadRandom, group_categories, max_popularity,
};

use crate::config::EngineConfig;

/// One liked event in a user profile, with its current decay weight
#[derive(Debug, Clone, PartialEq)]
pub struct LikedEvent {
    pub event_id: EventId,
    pub liked_at: DateTime<Utc>,
    pub days_since_like: i64,
    pub decay_weight: f64,
}

/// What the engine currently knows about a user's taste
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub likes: Vec<LikedEvent>,
    /// Bookmarked event ids, ascending
    pub bookmarks: Vec<EventId>,
    /// Category weights, heaviest first
    pub category_weights: Vec<(CategoryLabel, f64)>,
}

/// Random source implied by the configuration: seeded if a seed is set
pub(crate) fn random_source(config: &EngineConfig) -> Arc<dyn RandomSource> {
    match config.random_seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    }
}

/// Main orchestrator that coordinates the recommendation pipeline
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    catalog: Arc<dyn EventCatalog>,
    categories: Arc<dyn CategoryIndex>,
    likes: Arc<dyn LikeHistoryStore>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    filter_pipeline: Arc<FilterPipeline>,
    affinity: PersonalAffinityScorer,
    aggregator: RankingAggregator,
    personalized_weights: ScoreWeights,
    cold_start_weights: ScoreWeights,
}

impl RecommendationOrchestrator {
    /// Create a new orchestrator with all components initialized
    ///
    /// Uses the system clock. Diversity draws are seeded when
    /// `config.random_seed` is set, thread-local otherwise.
    pub fn new(
        catalog: Arc<dyn EventCatalog>,
        categories: Arc<dyn CategoryIndex>,
        likes: Arc<dyn LikeHistoryStore>,
        config: &EngineConfig,
    ) -> Self {
        let filter_pipeline = Arc::new(FilterPipeline::new().add_filter(FutureEventsFilter));
        let affinity = PersonalAffinityScorer::new()
            .with_decay_lambda(config.decay_lambda)
            .with_clamp_future_likes(config.clamp_future_likes);
        let diversity = DiversityInjector::new()
            .with_probability(config.diversity_probability)
            .with_boost(config.diversity_boost);
        let aggregator = RankingAggregator::new(diversity).with_limit(config.recommendation_limit);

        Self {
            catalog,
            categories,
            likes,
            clock: Arc::new(SystemClock),
            random: random_source(config),
            filter_pipeline,
            affinity,
            aggregator,
            personalized_weights: config.personalized_weights,
            cold_start_weights: config.cold_start_weights,
        }
    }

    /// Orchestrator over a single in-memory index serving all three roles
    pub fn from_index(index: Arc<EventIndex>, config: &EngineConfig) -> Self {
        Self::new(index.clone(), index.clone(), index, config)
    }

    /// Replace the clock (builder style)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the randomness source (builder style)
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Main entry point: get recommendations for a user
    ///
    /// # Returns
    /// Up to `recommendation_limit` upcoming events, best first. Unknown users
    /// get an empty list.
    #[instrument(skip(self, filter))]
    pub fn compute_recommendations(
        &self,
        user_id: &str,
        filter: &EventFilter,
    ) -> Result<Vec<Event>> {
        let start_time = Instant::now();
        let now = self.clock.now();

        let candidates = self.fetch_upcoming(filter, now)?;
        info!("{} upcoming candidates", candidates.len());

        if !self
            .likes
            .user_exists(user_id)
            .context("Failed to look up user")?
        {
            info!("No user found for user_id {}", user_id);
            return Ok(Vec::new());
        }

        let likes = self
            .likes
            .like_entries(user_id)
            .context("Failed to fetch like history")?;

        let recommendations = if likes.is_empty() {
            info!("User {} has no likes, using cold start ranking", user_id);
            self.cold_start_recommendations(candidates)
        } else {
            debug!("User {} has {} likes", user_id, likes.len());
            self.personalized_recommendations(candidates, &likes, now)?
        };

        info!(
            "Selected {} recommendations for user {} in {:.2?}",
            recommendations.len(),
            user_id,
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// Rank with the cold start weights and no personal scores.
    pub fn cold_start_recommendations(&self, candidates: Vec<Event>) -> Vec<Event> {
        let max = max_popularity(&candidates);
        self.aggregator
            .rank(candidates, None, max, self.cold_start_weights, self.random.as_ref())
    }

    /// Current decay weights, category weights and bookmarks of a user.
    ///
    /// `None` for unknown users.
    pub fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        if !self
            .likes
            .user_exists(user_id)
            .context("Failed to look up user")?
        {
            return Ok(None);
        }

        let now = self.clock.now();
        let likes = self
            .likes
            .like_entries(user_id)
            .context("Failed to fetch like history")?;
        let liked_ids: Vec<EventId> = likes.iter().map(|l| l.event_id).collect();
        let categories = group_categories(
            &self
                .categories
                .categories_for_events(&liked_ids)
                .context("Failed to fetch event categories")?,
        );

        let mut category_weights: Vec<(CategoryLabel, f64)> = self
            .affinity
            .category_weights(&likes, &categories, now)
            .into_iter()
            .collect();
        category_weights.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let bookmarks = self
            .likes
            .bookmarks(user_id)
            .context("Failed to fetch bookmarks")?;

        let likes = likes
            .iter()
            .map(|like| {
                let days_since_like = self.affinity.days_since(like.timestamp, now);
                LikedEvent {
                    event_id: like.event_id,
                    liked_at: like.timestamp,
                    days_since_like,
                    decay_weight: self.affinity.decay_weight(days_since_like),
                }
            })
            .collect();

        Ok(Some(UserProfile {
            user_id: user_id.to_string(),
            likes,
            bookmarks,
            category_weights,
        }))
    }

    /// Fetch candidates and keep those starting after `now`
    fn fetch_upcoming(&self, filter: &EventFilter, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let events = self
            .catalog
            .fetch_events(filter, now)
            .context("Failed to fetch candidate events")?;
        self.filter_pipeline
            .apply(events, &FilterContext::new(now))
            .context("Failed to apply filters")
    }

    fn personalized_recommendations(
        &self,
        candidates: Vec<Event>,
        likes: &[LikeEntry],
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let categories = self.batch_categories(&candidates, likes)?;
        let personal = self.affinity.score(likes, &candidates, &categories, now);
        let max = max_popularity(&candidates);

        Ok(self.aggregator.rank(
            candidates,
            Some(&personal),
            max,
            self.personalized_weights,
            self.random.as_ref(),
        ))
    }

    /// One category lookup covering candidates and liked events
    fn batch_categories(
        &self,
        candidates: &[Event],
        likes: &[LikeEntry],
    ) -> Result<HashMap<EventId, Vec<CategoryLabel>>> {
        let ids: Vec<EventId> = candidates
            .iter()
            .map(|e| e.id)
            .chain(likes.iter().map(|l| l.event_id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = self
            .categories
            .categories_for_events(&ids)
            .context("Failed to fetch event categories")?;
        debug!("Fetched {} category rows for {} events", rows.len(), ids.len());
        Ok(group_categories(&rows))
    }
}
