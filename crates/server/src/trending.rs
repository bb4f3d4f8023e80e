//! Trending service: batch recalculation and ranked retrieval.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use catalog::{Event, EventCatalog, EventFilter, EventIndex};
use scoring::{Clock, SystemClock, TrendingScorer};

use crate::config::EngineConfig;

#[derive(Clone)]
pub struct TrendingService {
    catalog: Arc<dyn EventCatalog>,
    clock: Arc<dyn Clock>,
    scorer: TrendingScorer,
}

impl TrendingService {
    pub fn new(catalog: Arc<dyn EventCatalog>, config: &EngineConfig) -> Self {
        Self {
            catalog,
            clock: Arc::new(SystemClock),
            scorer: TrendingScorer::new().with_limit(config.recommendation_limit),
        }
    }

    pub fn from_index(index: Arc<EventIndex>, config: &EngineConfig) -> Self {
        Self::new(index, config)
    }

    /// Replace the clock (builder style)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Recompute and persist the trending score of every event.
    ///
    /// Scores written by this pass are comparable with each other; counters
    /// that change during the pass are picked up by the next one.
    #[instrument(skip(self))]
    pub fn recalculate_trending_scores(&self) -> Result<()> {
        let events = self
            .catalog
            .fetch_events(&EventFilter::default(), self.clock.now())
            .context("Failed to fetch events for trending recalculation")?;

        let updated = self
            .scorer
            .recalculate(self.catalog.as_ref(), &events)
            .context("Failed to persist trending scores")?;
        info!("Trending scores updated for {} events", updated);
        Ok(())
    }

    /// Events matching `filter`, highest stored trending score first.
    #[instrument(skip(self))]
    pub fn fetch_trending_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let events = self
            .catalog
            .fetch_events(filter, self.clock.now())
            .context("Failed to fetch trending events")?;
        Ok(self.scorer.fetch(events))
    }
}
