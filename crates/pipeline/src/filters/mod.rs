//! Filter implementations for the candidate pipeline.

pub mod future_events;

pub use future_events::FutureEventsFilter;
