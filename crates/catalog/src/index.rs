//! In-memory event store.
//!
//! `EventIndex` holds events, users, categories, likes and bookmarks, and
//! implements every collaborator trait the scoring core consumes. Reads take a
//! shared lock, mutations an exclusive one; a trending recalculation pass is a
//! sequence of individual writes, not one transaction.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::filter::EventFilter;
use crate::traits::{CategoryIndex, EventCatalog, LikeHistoryStore};
use crate::types::*;

/// Plain data behind the lock.
#[derive(Debug, Default)]
pub(crate) struct IndexData {
    /// Ordered by id so catalog order is stable across runs
    pub(crate) events: BTreeMap<EventId, Event>,
    pub(crate) users: HashMap<UserId, User>,
    pub(crate) categories: BTreeMap<CategoryId, Category>,
    pub(crate) event_categories: HashMap<EventId, Vec<CategoryId>>,
    /// One timestamp per (user, event), which makes likes unique by construction
    pub(crate) user_likes: HashMap<UserId, BTreeMap<EventId, DateTime<Utc>>>,
    pub(crate) user_bookmarks: HashMap<UserId, BTreeSet<EventId>>,
}

impl IndexData {
    fn labels_of(&self, event_id: EventId) -> Vec<CategoryLabel> {
        self.event_categories
            .get(&event_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.categories.get(id))
                    .map(|c| c.category_name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check_user_and_event(&self, user_id: &str, event_id: EventId) -> Result<()> {
        if !self.users.contains_key(user_id) {
            return Err(CatalogError::missing("User", user_id));
        }
        if !self.events.contains_key(&event_id) {
            return Err(CatalogError::missing("Event", event_id));
        }
        Ok(())
    }
}

/// Thread-safe in-memory catalog, category index and user activity.
#[derive(Debug, Default)]
pub struct EventIndex {
    pub(crate) data: RwLock<IndexData>,
}

impl EventIndex {
    /// Creates a new, empty EventIndex
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_data(data: IndexData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, IndexData>> {
        self.data.read().map_err(|_| CatalogError::LockPoisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, IndexData>> {
        self.data.write().map_err(|_| CatalogError::LockPoisoned)
    }

    // Getters

    /// All events in id order.
    pub fn all_events(&self) -> Result<Vec<Event>> {
        Ok(self.read()?.events.values().cloned().collect())
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.read()?.users.get(user_id).cloned())
    }

    /// All user ids, sorted.
    pub fn user_ids(&self) -> Result<Vec<UserId>> {
        let mut ids: Vec<UserId> = self.read()?.users.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Category labels of one event (empty if it has none).
    pub fn categories_of(&self, event_id: EventId) -> Result<Vec<CategoryLabel>> {
        Ok(self.read()?.labels_of(event_id))
    }

    /// Distinct event locations, sorted.
    pub fn all_locations(&self) -> Result<Vec<String>> {
        let data = self.read()?;
        let locations: BTreeSet<&String> = data
            .events
            .values()
            .map(|e| &e.location)
            .filter(|l| !l.is_empty())
            .collect();
        Ok(locations.into_iter().cloned().collect())
    }

    /// (events, users, likes) for debugging/validation
    pub fn counts(&self) -> Result<(usize, usize, usize)> {
        let data = self.read()?;
        let total_likes = data.user_likes.values().map(|likes| likes.len()).sum();
        Ok((data.events.len(), data.users.len(), total_likes))
    }

    // Mutators

    pub fn insert_event(&self, event: Event) -> Result<()> {
        self.write()?.events.insert(event.id, event);
        Ok(())
    }

    pub fn insert_user(&self, user: User) -> Result<()> {
        self.write()?.users.insert(user.user_id.clone(), user);
        Ok(())
    }

    pub fn insert_category(&self, category: Category) -> Result<()> {
        self.write()?
            .categories
            .insert(category.category_id, category);
        Ok(())
    }

    /// Attach a category to an event. Assigning the same pair twice is a no-op.
    pub fn assign_category(&self, event_id: EventId, category_id: CategoryId) -> Result<()> {
        let mut data = self.write()?;
        if !data.events.contains_key(&event_id) {
            return Err(CatalogError::missing("Event", event_id));
        }
        if !data.categories.contains_key(&category_id) {
            return Err(CatalogError::missing("Category", category_id));
        }
        let assigned = data.event_categories.entry(event_id).or_default();
        if !assigned.contains(&category_id) {
            assigned.push(category_id);
        }
        Ok(())
    }

    /// Like an event at `at`.
    ///
    /// A repeated like only refreshes the timestamp. Returns `true` when the
    /// like is new, in which case the event's `liked_count` is incremented.
    pub fn like_event(&self, user_id: &str, event_id: EventId, at: DateTime<Utc>) -> Result<bool> {
        let mut data = self.write()?;
        if !data.users.contains_key(user_id) {
            return Err(CatalogError::missing("User", user_id));
        }
        let IndexData {
            events, user_likes, ..
        } = &mut *data;
        let event = events
            .get_mut(&event_id)
            .ok_or_else(|| CatalogError::missing("Event", event_id))?;

        let is_new = user_likes
            .entry(user_id.to_string())
            .or_default()
            .insert(event_id, at)
            .is_none();
        if is_new {
            event.liked_count = event.liked_count.saturating_add(1);
        }
        debug!(user_id, event_id, is_new, "Recorded like");
        Ok(is_new)
    }

    /// Remove a like. Returns `true` if there was one to remove.
    pub fn unlike_event(&self, user_id: &str, event_id: EventId) -> Result<bool> {
        let mut data = self.write()?;
        let IndexData {
            events, user_likes, ..
        } = &mut *data;
        let event = events
            .get_mut(&event_id)
            .ok_or_else(|| CatalogError::missing("Event", event_id))?;

        let removed = user_likes
            .get_mut(user_id)
            .and_then(|likes| likes.remove(&event_id))
            .is_some();
        if removed {
            event.liked_count = event.liked_count.saturating_sub(1);
        }
        debug!(user_id, event_id, removed, "Removed like");
        Ok(removed)
    }

    /// Bookmark an event. Returns `false` if it was already bookmarked.
    ///
    /// Bookmarks are kept for the user's own reference and do not feed into
    /// scoring.
    pub fn bookmark_event(&self, user_id: &str, event_id: EventId) -> Result<bool> {
        let mut data = self.write()?;
        data.check_user_and_event(user_id, event_id)?;

        let is_new = data
            .user_bookmarks
            .entry(user_id.to_string())
            .or_default()
            .insert(event_id);
        debug!(user_id, event_id, is_new, "Recorded bookmark");
        Ok(is_new)
    }

    /// Remove a bookmark. Returns `true` if there was one to remove.
    pub fn unbookmark_event(&self, user_id: &str, event_id: EventId) -> Result<bool> {
        let mut data = self.write()?;
        data.check_user_and_event(user_id, event_id)?;

        let removed = data
            .user_bookmarks
            .get_mut(user_id)
            .is_some_and(|bookmarks| bookmarks.remove(&event_id));
        debug!(user_id, event_id, removed, "Removed bookmark");
        Ok(removed)
    }

    /// Increment the view counter, returning the new count.
    pub fn record_view(&self, event_id: EventId) -> Result<u32> {
        let mut data = self.write()?;
        let event = data
            .events
            .get_mut(&event_id)
            .ok_or_else(|| CatalogError::missing("Event", event_id))?;
        event.viewed_count = event.viewed_count.saturating_add(1);
        Ok(event.viewed_count)
    }
}

impl EventCatalog for EventIndex {
    fn fetch_events(&self, filter: &EventFilter, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let data = self.read()?;
        let events: Vec<Event> = data
            .events
            .values()
            .filter(|event| filter.matches(event, &data.labels_of(event.id), now))
            .cloned()
            .collect();
        debug!(
            "Fetched {} of {} events for filter {:?}",
            events.len(),
            data.events.len(),
            filter
        );
        Ok(events)
    }

    fn get_event(&self, event_id: EventId) -> Result<Option<Event>> {
        Ok(self.read()?.events.get(&event_id).cloned())
    }

    fn persist_trending_score(&self, event_id: EventId, score: f64) -> Result<()> {
        let mut data = self.write()?;
        match data.events.get_mut(&event_id) {
            Some(event) => {
                event.trending_score = score;
                Ok(())
            }
            None => {
                warn!(event_id, "Trending score for unknown event");
                Err(CatalogError::missing("Event", event_id))
            }
        }
    }
}

impl CategoryIndex for EventIndex {
    fn categories_for_events(&self, event_ids: &[EventId]) -> Result<Vec<EventCategory>> {
        let data = self.read()?;
        let rows = event_ids
            .iter()
            .flat_map(|&event_id| {
                data.labels_of(event_id)
                    .into_iter()
                    .map(move |category| EventCategory { event_id, category })
            })
            .collect();
        Ok(rows)
    }
}

impl LikeHistoryStore for EventIndex {
    fn user_exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.read()?.users.contains_key(user_id))
    }

    fn like_entries(&self, user_id: &str) -> Result<Vec<LikeEntry>> {
        let data = self.read()?;
        let likes = data
            .user_likes
            .get(user_id)
            .map(|likes| {
                likes
                    .iter()
                    .map(|(&event_id, &timestamp)| LikeEntry {
                        event_id,
                        timestamp,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(likes)
    }

    fn bookmarks(&self, user_id: &str) -> Result<Vec<EventId>> {
        let data = self.read()?;
        let bookmarks = data
            .user_bookmarks
            .get(user_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        Ok(bookmarks)
    }
}
