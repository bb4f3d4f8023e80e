//! Filtering and ranking of candidate events.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - RankingAggregator for blending scores into a top-N list
//!
//! ## Architecture
//! Candidates are processed in stages:
//! 1. Filters remove events that cannot be recommended (already started)
//! 2. Personal scores are computed by the `scoring` crate
//! 3. RankingAggregator blends personal, trending and diversity scores, sorts
//!    and truncates
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterContext, FilterPipeline, RankingAggregator};
//! use pipeline::filters::FutureEventsFilter;
//!
//! let pipeline = FilterPipeline::new().add_filter(FutureEventsFilter);
//! let upcoming = pipeline.apply(events, &FilterContext::new(now))?;
//!
//! let max = scoring::max_popularity(&upcoming);
//! let ranked = RankingAggregator::default()
//!     .rank(upcoming, Some(&personal), max, ScoreWeights::PERSONALIZED, &random);
//! ```

pub mod filter_pipeline;
pub mod filters;
pub mod ranking;
pub mod traits;

// Re-export main types
pub use filter_pipeline::FilterPipeline;
pub use ranking::{RankingAggregator, ScoredEvent};
pub use traits::{Filter, FilterContext};
