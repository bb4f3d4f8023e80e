//! Simple test harness for the recommendation orchestrator.
//!
//! Loads a snapshot directory and prints recommendations and trending events.
//!
//! Usage: `server [DATA_DIR] [USER_ID]` (defaults: `data/campus`, `test_user1`)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog::{EventFilter, EventIndex};
use server::{EngineConfig, RecommendationOrchestrator, TrendingService};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,server=debug,scoring=debug,pipeline=debug")
        }))
        .init();

    info!("Starting event recommendation test harness");

    let mut args = std::env::args().skip(1);
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "data/campus".to_string()));
    let user_id = args.next().unwrap_or_else(|| "test_user1".to_string());

    let config = EngineConfig::from_env().context("Invalid engine configuration")?;
    info!("Engine configuration: {:?}", config);

    info!("Loading event snapshot...");
    let index = Arc::new(
        EventIndex::load_from_dir(&data_dir)
            .with_context(|| format!("Failed to load snapshot from {}", data_dir.display()))?,
    );

    let trending = TrendingService::from_index(index.clone(), &config);
    trending.recalculate_trending_scores()?;

    let orchestrator = RecommendationOrchestrator::from_index(index, &config);
    let recommendations = orchestrator.compute_recommendations(&user_id, &EventFilter::new())?;

    info!("Received {} recommendations for {}:", recommendations.len(), user_id);
    for (i, event) in recommendations.iter().enumerate() {
        info!(
            "{}. {} @ {} ({}) - trending {:.3}",
            i + 1,
            event.name,
            event.location,
            event.start_time.format("%a %b %e %H:%M"),
            event.trending_score
        );
    }

    let top = trending.fetch_trending_events(&EventFilter::new())?;
    info!("Top trending:");
    for event in top.iter().take(5) {
        info!("  {} ({:.3})", event.name, event.trending_score);
    }

    Ok(())
}
