//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to candidate events.

use anyhow::Result;
use catalog::Event;
use chrono::{DateTime, Utc};

/// Per-request inputs every filter may consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterContext {
    /// The request's notion of "now", taken once from the clock
    pub now: DateTime<Utc>,
}

impl FilterContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

/// Core trait for filtering candidate events.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be used in concurrent contexts
/// - Filters take ownership of the Vec<Event> and return a filtered Vec
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of events.
    ///
    /// # Arguments
    /// * `events` - The events to filter (takes ownership)
    /// * `context` - Request context
    ///
    /// # Returns
    /// * `Ok(Vec<Event>)` - The events that passed, in input order
    /// * `Err` - If filtering fails
    fn apply(&self, events: Vec<Event>, context: &FilterContext) -> Result<Vec<Event>>;
}
