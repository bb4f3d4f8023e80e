//! Collaborator traits consumed by the scoring core.
//!
//! The recommendation and trending engines only ever see data through these
//! three narrow interfaces. [`EventIndex`](crate::EventIndex) implements all of
//! them in memory; a relational backend would implement them over SQL.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::filter::EventFilter;
use crate::types::{Event, EventCategory, EventId, LikeEntry};

/// Source of candidate events.
///
/// ## Design Note
/// - `Send + Sync` so one store can back many concurrent requests
/// - `now` is passed in so time windows follow the caller's clock
pub trait EventCatalog: Send + Sync {
    /// All events matching `filter`, in catalog order.
    fn fetch_events(&self, filter: &EventFilter, now: DateTime<Utc>) -> Result<Vec<Event>>;

    /// A single event by id, `None` if it does not exist.
    fn get_event(&self, event_id: EventId) -> Result<Option<Event>>;

    /// Overwrite the stored trending score of one event.
    fn persist_trending_score(&self, event_id: EventId, score: f64) -> Result<()>;
}

/// Batch lookup of category labels.
pub trait CategoryIndex: Send + Sync {
    /// One row per (event, category) pair for the requested ids.
    ///
    /// Events without categories simply produce no rows.
    fn categories_for_events(&self, event_ids: &[EventId]) -> Result<Vec<EventCategory>>;
}

/// A user's like history, plus the bookmarks shown alongside it.
pub trait LikeHistoryStore: Send + Sync {
    fn user_exists(&self, user_id: &str) -> Result<bool>;

    /// Like entries of the user; empty for unknown users.
    fn like_entries(&self, user_id: &str) -> Result<Vec<LikeEntry>>;

    /// Bookmarked event ids of the user in ascending order; empty for unknown
    /// users. Not used for scoring.
    fn bookmarks(&self, user_id: &str) -> Result<Vec<EventId>>;
}
