//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::traits::{Filter, FilterContext};
use anyhow::{Context, Result};
use catalog::Event;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new().add_filter(FutureEventsFilter);
///
/// let upcoming = pipeline.apply(events, &FilterContext::new(clock.now()))?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Number of filters in the pipeline
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in sequence to the events.
    ///
    /// ## Algorithm
    /// 1. Start with the input events
    /// 2. For each filter in order:
    ///    a. Log filter name and input count
    ///    b. Apply the filter
    ///    c. Log output count
    /// 3. Return final filtered set
    ///
    /// # Returns
    /// * `Ok(Vec<Event>)` - The events after all filters
    /// * `Err` - If any filter fails, naming the filter
    pub fn apply(&self, events: Vec<Event>, context: &FilterContext) -> Result<Vec<Event>> {
        let mut current = events;
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter
                .apply(current, context)
                .with_context(|| format!("Filter {} failed", filter.name()))?;
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FutureEventsFilter;
    use chrono::{Duration, TimeZone, Utc};

    struct FailingFilter;

    impl Filter for FailingFilter {
        fn name(&self) -> &str {
            "FailingFilter"
        }

        fn apply(&self, _events: Vec<Event>, _context: &FilterContext) -> Result<Vec<Event>> {
            anyhow::bail!("backend unavailable")
        }
    }

    fn context() -> FilterContext {
        FilterContext::new(Utc.with_ymd_and_hms(2025, 4, 16, 12, 0, 0).unwrap())
    }

    fn events() -> Vec<Event> {
        let now = context().now;
        vec![
            Event::new(1, "Past", now - Duration::days(2)),
            Event::new(2, "Upcoming", now + Duration::days(2)),
        ]
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        assert!(pipeline.is_empty());

        let filtered = pipeline.apply(events(), &context()).unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_single_filter() {
        let pipeline = FilterPipeline::new().add_filter(FutureEventsFilter);

        let filtered = pipeline.apply(events(), &context()).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 2);
    }

    #[test]
    fn test_failure_names_filter() {
        let pipeline = FilterPipeline::new()
            .add_filter(FutureEventsFilter)
            .add_filter(FailingFilter);
        assert_eq!(pipeline.len(), 2);

        let err = pipeline.apply(events(), &context()).unwrap_err();
        assert!(format!("{:#}", err).contains("FailingFilter"));
    }
}
