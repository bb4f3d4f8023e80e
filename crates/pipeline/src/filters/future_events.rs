//! Drops events that have already started.

use crate::traits::{Filter, FilterContext};
use anyhow::Result;
use catalog::Event;

/// Keeps only events with `start_time` strictly after `now`.
///
/// An event starting exactly at `now` is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FutureEventsFilter;

impl Filter for FutureEventsFilter {
    fn name(&self) -> &str {
        "FutureEventsFilter"
    }

    fn apply(&self, events: Vec<Event>, context: &FilterContext) -> Result<Vec<Event>> {
        Ok(events
            .into_iter()
            .filter(|event| event.start_time > context.now)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_future_events_filter() {
        let events = vec![
            Event::new(1, "Yesterday", now() - Duration::days(1)), // past
            Event::new(2, "Right Now", now()),                    // starts at now
            Event::new(3, "Later Today", now() + Duration::hours(3)),
            Event::new(4, "Next Month", now() + Duration::days(30)),
        ];

        let filtered = FutureEventsFilter
            .apply(events, &FilterContext::new(now()))
            .unwrap();

        let ids: Vec<u32> = filtered.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn test_future_events_filter_empty() {
        let filtered = FutureEventsFilter
            .apply(Vec::new(), &FilterContext::new(now()))
            .unwrap();
        assert!(filtered.is_empty());
    }
}
