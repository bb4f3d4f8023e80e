//! Core domain types for the event catalog.
//!
//! Events, users, categories and like entries, plus the flat record types the
//! JSON snapshot is made of.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for an event
pub type EventId = u32;

/// Unique identifier for a user (free-form, e.g. "test_user1")
pub type UserId = String;

/// Unique identifier for a category
pub type CategoryId = u32;

/// Human-readable category label, e.g. "Music"
pub type CategoryLabel = String;

// =============================================================================
// Event
// =============================================================================

/// A scheduled event with its popularity counters.
///
/// Category labels are not embedded here; they come from the
/// [`CategoryIndex`](crate::CategoryIndex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// IANA zone label the organiser published the times in
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub liked_count: u32,
    #[serde(default)]
    pub viewed_count: u32,
    /// Snapshot written by the last trending recalculation, in [0, 1]
    #[serde(default)]
    pub trending_score: f64,
}

impl Event {
    /// Create an event with zeroed counters and empty descriptive fields.
    pub fn new(id: EventId, name: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            start_time,
            end_time: None,
            timezone: "UTC".to_string(),
            location: String::new(),
            description: String::new(),
            event_type: None,
            link: None,
            latitude: None,
            longitude: None,
            liked_count: 0,
            viewed_count: 0,
            trending_score: 0.0,
        }
    }

    /// Set the like and view counters (builder style).
    pub fn with_counts(mut self, liked_count: u32, viewed_count: u32) -> Self {
        self.liked_count = liked_count;
        self.viewed_count = viewed_count;
        self
    }

    /// Set the location (builder style).
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Raw popularity: likes plus views.
    pub fn popularity(&self) -> u64 {
        u64::from(self.liked_count) + u64::from(self.viewed_count)
    }
}

// =============================================================================
// Users and likes
// =============================================================================

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub user_name: String,
}

impl User {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            email: String::new(),
            user_name: String::new(),
        }
    }
}

/// One like action of a user: which event, and when it was (last) liked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEntry {
    pub event_id: EventId,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Categories
// =============================================================================

/// A category known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: CategoryId,
    pub category_name: CategoryLabel,
}

/// One (event, category label) pair as returned by the category index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventCategory {
    pub event_id: EventId,
    pub category: CategoryLabel,
}

// =============================================================================
// Snapshot records
// =============================================================================

/// Row of `event_categories.json`: assigns a category to an event by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub event_id: EventId,
    pub category_id: CategoryId,
}

/// Row of `user_likes.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLike {
    pub user_id: UserId,
    pub event_id: EventId,
    pub timestamp: DateTime<Utc>,
}

/// Row of `user_bookmarks.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBookmark {
    pub user_id: UserId,
    pub event_id: EventId,
}
