//! Server crate for the event recommendation engine.
//!
//! This crate wires the catalog, scorers and ranking stage together:
//! - `RecommendationOrchestrator`: per-user recommendations
//! - `TrendingService`: trending recalculation and retrieval
//! - `EngineConfig`: tuning, from defaults, a JSON file or the environment

pub mod config;
pub mod orchestrator;
pub mod trending;

pub use config::{ConfigError, EngineConfig};
pub use orchestrator::{LikedEvent, RecommendationOrchestrator, UserProfile};
pub use trending::TrendingService;
