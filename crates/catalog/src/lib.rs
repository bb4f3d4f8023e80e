//! # Catalog Crate
//!
//! Event data and the collaborator interfaces the recommendation core reads
//! through.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Event, User, Category, LikeEntry)
//! - **filter**: Candidate filter (category, time window, location)
//! - **traits**: `EventCatalog`, `CategoryIndex`, `LikeHistoryStore`
//! - **index**: `EventIndex`, an in-memory store implementing all three traits
//! - **loader**: JSON snapshot loading and saving
//! - **error**: Error types for catalog access
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{EventCatalog, EventFilter, EventIndex, TimeWindow};
//! use std::path::Path;
//!
//! let index = EventIndex::load_from_dir(Path::new("data/campus"))?;
//! let filter = EventFilter::new().with_time(TimeWindow::ThisWeekend);
//! let events = index.fetch_events(&filter, chrono::Utc::now())?;
//!
//! println!("{} events this weekend", events.len());
//! ```

pub mod error;
pub mod filter;
pub mod index;
pub mod loader;
pub mod traits;
pub mod types;

pub use error::{CatalogError, Result};
pub use filter::{EventFilter, TimeWindow};
pub use index::EventIndex;
pub use traits::{CategoryIndex, EventCatalog, LikeHistoryStore};
pub use types::{
    // Type aliases
    CategoryId,
    CategoryLabel,
    EventId,
    UserId,
    // Core types
    Category,
    CategoryAssignment,
    Event,
    EventCategory,
    LikeEntry,
    User,
    UserBookmark,
    UserLike,
};
