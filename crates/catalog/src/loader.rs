//! JSON snapshot loading and saving for [`EventIndex`].
//!
//! A snapshot is a directory of five required files and one optional one:
//! - `events.json`: `[Event]`
//! - `categories.json`: `[{category_id, category_name}]`
//! - `event_categories.json`: `[{event_id, category_id}]`
//! - `users.json`: `[{user_id, email, user_name}]`
//! - `user_likes.json`: `[{user_id, event_id, timestamp}]`
//! - `user_bookmarks.json` (optional): `[{user_id, event_id}]`

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::{CatalogError, Result};
use crate::index::{EventIndex, IndexData};
use crate::types::*;

pub const EVENTS_FILE: &str = "events.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const EVENT_CATEGORIES_FILE: &str = "event_categories.json";
pub const USERS_FILE: &str = "users.json";
pub const USER_LIKES_FILE: &str = "user_likes.json";
pub const USER_BOOKMARKS_FILE: &str = "user_bookmarks.json";

/// Read one snapshot file into a vector of records.
fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CatalogError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => CatalogError::IoError(e),
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| CatalogError::ParseError {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Like [`read_records`], but a missing file reads as no records.
fn read_optional_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match read_records(path) {
        Err(CatalogError::FileNotFound { .. }) => Ok(Vec::new()),
        other => other,
    }
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), records).map_err(|e| {
        CatalogError::ParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        }
    })
}

impl EventIndex {
    /// Load a snapshot directory.
    ///
    /// Steps:
    /// 1. Parse all files (in parallel)
    /// 2. Build the index
    /// 3. Validate referential integrity
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading event snapshot from {:?}", data_dir);

        let events_path = data_dir.join(EVENTS_FILE);
        let categories_path = data_dir.join(CATEGORIES_FILE);
        let assignments_path = data_dir.join(EVENT_CATEGORIES_FILE);
        let users_path = data_dir.join(USERS_FILE);
        let likes_path = data_dir.join(USER_LIKES_FILE);
        let bookmarks_path = data_dir.join(USER_BOOKMARKS_FILE);

        // Nested joins give six-way parallelism
        let ((events, categories), ((assignments, users), (likes, bookmarks))) = rayon::join(
            || {
                rayon::join(
                    || read_records::<Event>(&events_path),
                    || read_records::<Category>(&categories_path),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || read_records::<CategoryAssignment>(&assignments_path),
                            || read_records::<User>(&users_path),
                        )
                    },
                    || {
                        rayon::join(
                            || read_records::<UserLike>(&likes_path),
                            || read_optional_records::<UserBookmark>(&bookmarks_path),
                        )
                    },
                )
            },
        );

        let events = events?;
        let categories = categories?;
        let assignments = assignments?;
        let users = users?;
        let likes = likes?;
        let bookmarks = bookmarks?;

        info!(
            "Loaded {} events, {} categories, {} category assignments, {} users, {} likes, \
             {} bookmarks",
            events.len(),
            categories.len(),
            assignments.len(),
            users.len(),
            likes.len(),
            bookmarks.len()
        );

        let data = build_index_data(events, categories, assignments, users, likes, bookmarks);
        validate(&data)?;

        info!("EventIndex successfully built and validated");
        Ok(EventIndex::from_data(data))
    }

    /// Write the current state back as a snapshot directory.
    pub fn save_to_dir(&self, data_dir: &Path) -> Result<()> {
        fs::create_dir_all(data_dir)?;
        let data = self.read()?;

        let events: Vec<&Event> = data.events.values().collect();
        let categories: Vec<&Category> = data.categories.values().collect();

        let mut assignments: Vec<CategoryAssignment> = data
            .event_categories
            .iter()
            .flat_map(|(&event_id, ids)| {
                ids.iter().map(move |&category_id| CategoryAssignment {
                    event_id,
                    category_id,
                })
            })
            .collect();
        assignments.sort_by_key(|a| (a.event_id, a.category_id));

        let mut users: Vec<&User> = data.users.values().collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        let mut likes: Vec<UserLike> = data
            .user_likes
            .iter()
            .flat_map(|(user_id, entries)| {
                entries.iter().map(move |(&event_id, &timestamp)| UserLike {
                    user_id: user_id.clone(),
                    event_id,
                    timestamp,
                })
            })
            .collect();
        likes.sort_by(|a, b| (&a.user_id, a.event_id).cmp(&(&b.user_id, b.event_id)));

        let mut bookmarks: Vec<UserBookmark> = data
            .user_bookmarks
            .iter()
            .flat_map(|(user_id, ids)| {
                ids.iter().map(move |&event_id| UserBookmark {
                    user_id: user_id.clone(),
                    event_id,
                })
            })
            .collect();
        bookmarks.sort_by(|a, b| (&a.user_id, a.event_id).cmp(&(&b.user_id, b.event_id)));

        write_records(&data_dir.join(EVENTS_FILE), &events)?;
        write_records(&data_dir.join(CATEGORIES_FILE), &categories)?;
        write_records(&data_dir.join(EVENT_CATEGORIES_FILE), &assignments)?;
        write_records(&data_dir.join(USERS_FILE), &users)?;
        write_records(&data_dir.join(USER_LIKES_FILE), &likes)?;
        write_records(&data_dir.join(USER_BOOKMARKS_FILE), &bookmarks)?;

        info!("Saved event snapshot to {:?}", data_dir);
        Ok(())
    }
}

fn build_index_data(
    events: Vec<Event>,
    categories: Vec<Category>,
    assignments: Vec<CategoryAssignment>,
    users: Vec<User>,
    likes: Vec<UserLike>,
    bookmarks: Vec<UserBookmark>,
) -> IndexData {
    let mut data = IndexData {
        events: events.into_iter().map(|e| (e.id, e)).collect(),
        users: users.into_iter().map(|u| (u.user_id.clone(), u)).collect(),
        categories: categories
            .into_iter()
            .map(|c| (c.category_id, c))
            .collect(),
        event_categories: HashMap::new(),
        user_likes: HashMap::new(),
        user_bookmarks: HashMap::new(),
    };

    for assignment in assignments {
        let assigned = data
            .event_categories
            .entry(assignment.event_id)
            .or_default();
        if !assigned.contains(&assignment.category_id) {
            assigned.push(assignment.category_id);
        }
    }

    for like in likes {
        let entries: &mut BTreeMap<EventId, _> =
            data.user_likes.entry(like.user_id.clone()).or_default();
        // Duplicate rows collapse to the most recent like
        let latest = entries.entry(like.event_id).or_insert(like.timestamp);
        if like.timestamp > *latest {
            warn!(
                user_id = %like.user_id,
                event_id = like.event_id,
                "Duplicate like in snapshot, keeping the latest timestamp"
            );
            *latest = like.timestamp;
        }
    }

    for bookmark in bookmarks {
        data.user_bookmarks
            .entry(bookmark.user_id)
            .or_default()
            .insert(bookmark.event_id);
    }

    data
}

/// Check that:
/// - every like and bookmark references a known user and event
/// - every category assignment references a known event and category
/// - stored trending scores are within [0, 1]
fn validate(data: &IndexData) -> Result<()> {
    let liked = data
        .user_likes
        .iter()
        .flat_map(|(user_id, likes)| likes.keys().map(move |event_id| (user_id, event_id)));
    let bookmarked = data
        .user_bookmarks
        .iter()
        .flat_map(|(user_id, ids)| ids.iter().map(move |event_id| (user_id, event_id)));
    for (user_id, event_id) in liked.chain(bookmarked) {
        if !data.users.contains_key(user_id) {
            return Err(CatalogError::missing("User", user_id));
        }
        if !data.events.contains_key(event_id) {
            return Err(CatalogError::missing("Event", event_id));
        }
    }

    for (event_id, category_ids) in &data.event_categories {
        if !data.events.contains_key(event_id) {
            return Err(CatalogError::missing("Event", event_id));
        }
        for category_id in category_ids {
            if !data.categories.contains_key(category_id) {
                return Err(CatalogError::missing("Category", category_id));
            }
        }
    }

    for event in data.events.values() {
        if !(0.0..=1.0).contains(&event.trending_score) {
            return Err(CatalogError::InvalidValue {
                field: format!("trending_score of event {}", event.id),
                value: event.trending_score.to_string(),
            });
        }
    }

    Ok(())
}
