use anyhow::{Context, Result, anyhow};
use catalog::{
    Event, EventCatalog, EventFilter, EventId, EventIndex, LikeHistoryStore, TimeWindow, UserId,
};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use scoring::{Clock, SystemClock};
use server::{EngineConfig, RecommendationOrchestrator, TrendingService, UserProfile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// EventRecs - Event Recommendation Engine
#[derive(Parser)]
#[command(name = "event-recs")]
#[command(
    about = "Event recommendations from likes, popularity and a little chance",
    long_about = None
)]
struct Cli {
    /// Path to the event snapshot directory
    #[arg(short, long, default_value = "data/campus")]
    data_dir: PathBuf,

    /// JSON engine configuration (defaults and EVENT_RECS_* variables otherwise)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for reproducible diversity draws
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Candidate restrictions shared by `recommend` and `trending`
#[derive(Args, Debug, Clone)]
struct FilterArgs {
    /// Only events in this category (case-insensitive)
    #[arg(long)]
    category: Option<String>,

    /// Time window: today, tomorrow, this-week, this-weekend, next-week
    #[arg(long)]
    time: Option<TimeWindow>,

    /// Only events whose location contains this text
    #[arg(long)]
    near: Option<String>,
}

impl From<FilterArgs> for EventFilter {
    fn from(args: FilterArgs) -> Self {
        EventFilter {
            category: args.category,
            time: args.time,
            near: args.near,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Get event recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        #[command(flatten)]
        filter: FilterArgs,

        /// Show categories and popularity for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// List events by stored trending score
    Trending {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Recompute and save trending scores for all events
    Recalculate,

    /// Like an event (re-liking refreshes the like time)
    Like {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        event_id: EventId,
    },

    /// Remove a like
    Unlike {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        event_id: EventId,
    },

    /// Record a view of an event
    View {
        #[arg(long)]
        event_id: EventId,
    },

    /// Show one event with its categories
    Event {
        #[arg(long)]
        event_id: EventId,
    },

    /// Bookmark an event (does not affect recommendations)
    Bookmark {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        event_id: EventId,
    },

    /// Remove a bookmark
    Unbookmark {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        event_id: EventId,
    },

    /// Show a user's likes and category weights
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// List distinct event locations
    Locations,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.seed)?;

    println!("Loading event snapshot from {}...", cli.data_dir.display());
    let start = Instant::now();
    let index = Arc::new(
        EventIndex::load_from_dir(&cli.data_dir).context("Failed to load event snapshot")?,
    );
    let (events, users, likes) = index.counts()?;
    println!(
        "{} Loaded {} events, {} users, {} likes in {:?}",
        "✓".green(),
        events,
        users,
        likes,
        start.elapsed()
    );

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            filter,
            explain,
        } => handle_recommend(index, &config, &user_id, filter.into(), explain)?,
        Commands::Trending { filter } => handle_trending(index, &config, filter.into())?,
        Commands::Recalculate => handle_recalculate(index, &config, &cli.data_dir)?,
        Commands::Like { user_id, event_id } => {
            handle_like(&index, &user_id, event_id, &cli.data_dir)?
        }
        Commands::Unlike { user_id, event_id } => {
            handle_unlike(&index, &user_id, event_id, &cli.data_dir)?
        }
        Commands::View { event_id } => handle_view(&index, event_id, &cli.data_dir)?,
        Commands::Event { event_id } => handle_event(&index, event_id)?,
        Commands::Bookmark { user_id, event_id } => {
            handle_bookmark(&index, &user_id, event_id, &cli.data_dir)?
        }
        Commands::Unbookmark { user_id, event_id } => {
            handle_unbookmark(&index, &user_id, event_id, &cli.data_dir)?
        }
        Commands::User { user_id } => handle_user(index, &config, &user_id)?,
        Commands::Locations => handle_locations(&index)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(index, &config, requests, concurrent).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::from_env().context("Invalid EVENT_RECS_* configuration")?,
    };
    Ok(match seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    })
}

/// Handle the 'recommend' command
fn handle_recommend(
    index: Arc<EventIndex>,
    config: &EngineConfig,
    user_id: &str,
    filter: EventFilter,
    explain: bool,
) -> Result<()> {
    let orchestrator = RecommendationOrchestrator::from_index(index.clone(), config);
    let recommendations = orchestrator.compute_recommendations(user_id, &filter)?;

    if recommendations.is_empty() && !index.user_exists(user_id)? {
        println!("{}", format!("No user found for {}", user_id).yellow());
        return Ok(());
    }

    println!("{}", format!("Recommendations for {}:", user_id).bold().blue());
    print_events(&index, &recommendations, explain)
}

/// Handle the 'trending' command
fn handle_trending(
    index: Arc<EventIndex>,
    config: &EngineConfig,
    filter: EventFilter,
) -> Result<()> {
    let trending = TrendingService::from_index(index.clone(), config);
    let events = trending.fetch_trending_events(&filter)?;

    println!("{}", "Trending events:".bold().blue());
    print_events(&index, &events, true)
}

/// Handle the 'recalculate' command
fn handle_recalculate(
    index: Arc<EventIndex>,
    config: &EngineConfig,
    data_dir: &Path,
) -> Result<()> {
    let start = Instant::now();
    TrendingService::from_index(index.clone(), config).recalculate_trending_scores()?;
    index.save_to_dir(data_dir).context("Failed to save snapshot")?;

    println!(
        "{} Recalculated trending scores in {:?}",
        "✓".green(),
        start.elapsed()
    );
    Ok(())
}

/// Handle the 'like' command
fn handle_like(
    index: &EventIndex,
    user_id: &str,
    event_id: EventId,
    data_dir: &Path,
) -> Result<()> {
    let is_new = index.like_event(user_id, event_id, SystemClock.now())?;
    index.save_to_dir(data_dir).context("Failed to save snapshot")?;

    if is_new {
        println!("{} {} liked event {}", "✓".green(), user_id, event_id);
    } else {
        println!(
            "{} {} already liked event {}, like time refreshed",
            "✓".green(),
            user_id,
            event_id
        );
    }
    Ok(())
}

/// Handle the 'unlike' command
fn handle_unlike(
    index: &EventIndex,
    user_id: &str,
    event_id: EventId,
    data_dir: &Path,
) -> Result<()> {
    if index.unlike_event(user_id, event_id)? {
        index.save_to_dir(data_dir).context("Failed to save snapshot")?;
        println!("{} {} no longer likes event {}", "✓".green(), user_id, event_id);
    } else {
        println!("{}", format!("{} had not liked event {}", user_id, event_id).yellow());
    }
    Ok(())
}

/// Handle the 'bookmark' command
fn handle_bookmark(
    index: &EventIndex,
    user_id: &str,
    event_id: EventId,
    data_dir: &Path,
) -> Result<()> {
    if index.bookmark_event(user_id, event_id)? {
        index.save_to_dir(data_dir).context("Failed to save snapshot")?;
        println!("{} {} bookmarked event {}", "✓".green(), user_id, event_id);
    } else {
        println!("{}", format!("{} already bookmarked event {}", user_id, event_id).yellow());
    }
    Ok(())
}

/// Handle the 'unbookmark' command
fn handle_unbookmark(
    index: &EventIndex,
    user_id: &str,
    event_id: EventId,
    data_dir: &Path,
) -> Result<()> {
    if index.unbookmark_event(user_id, event_id)? {
        index.save_to_dir(data_dir).context("Failed to save snapshot")?;
        println!("{} {} removed bookmark on event {}", "✓".green(), user_id, event_id);
    } else {
        println!("{}", format!("{} had not bookmarked event {}", user_id, event_id).yellow());
    }
    Ok(())
}

/// Handle the 'event' command
fn handle_event(index: &EventIndex, event_id: EventId) -> Result<()> {
    let event = index
        .get_event(event_id)?
        .ok_or_else(|| anyhow!("Event {} not found", event_id))?;

    println!("{}", format!("Event {}: {}", event.id, event.name).bold().blue());
    if !event.description.is_empty() {
        println!("{}", event.description);
    }
    if let Some(link) = &event.link {
        println!("{}", link.underline());
    }
    print_events(index, std::slice::from_ref(&event), true)
}

/// Handle the 'view' command
fn handle_view(index: &EventIndex, event_id: EventId, data_dir: &Path) -> Result<()> {
    let views = index.record_view(event_id)?;
    index.save_to_dir(data_dir).context("Failed to save snapshot")?;
    println!("{} Event {} now has {} views", "✓".green(), event_id, views);
    Ok(())
}

/// Handle the 'user' command
fn handle_user(index: Arc<EventIndex>, config: &EngineConfig, user_id: &str) -> Result<()> {
    let user = index
        .get_user(user_id)?
        .ok_or_else(|| anyhow!("User {} not found", user_id))?;
    let orchestrator = RecommendationOrchestrator::from_index(index.clone(), config);
    let profile: UserProfile = orchestrator
        .user_profile(user_id)?
        .ok_or_else(|| anyhow!("User {} not found", user_id))?;

    println!("{}", format!("User ID: {}", user.user_id).bold().blue());
    if !user.user_name.is_empty() {
        println!("{}Name: {}", "• ".green(), user.user_name);
    }
    if !user.email.is_empty() {
        println!("{}Email: {}", "• ".green(), user.email);
    }
    println!("{}Likes: {}", "• ".cyan(), profile.likes.len());
    if !profile.bookmarks.is_empty() {
        let ids: Vec<String> = profile.bookmarks.iter().map(|id| id.to_string()).collect();
        println!("{}Bookmarks: {}", "• ".cyan(), ids.join(", "));
    }

    if profile.likes.is_empty() {
        println!("No likes yet, recommendations use the cold start weights");
        return Ok(());
    }

    println!("Liked events:");
    for like in &profile.likes {
        let name = index
            .get_event(like.event_id)?
            .map(|e| e.name)
            .unwrap_or_else(|| "<unknown>".to_string());
        println!(
            "  - {} (liked {} days ago, weight {:.3})",
            name, like.days_since_like, like.decay_weight
        );
    }

    println!("Category weights:");
    for (category, weight) in &profile.category_weights {
        println!("  - {}: {:.3}", category, weight);
    }
    Ok(())
}

/// Handle the 'locations' command
fn handle_locations(index: &EventIndex) -> Result<()> {
    println!("{}", "Locations:".bold().blue());
    for location in index.all_locations()? {
        println!("  - {}", location);
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    index: Arc<EventIndex>,
    config: &EngineConfig,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let user_ids = index.user_ids()?;
    if user_ids.is_empty() {
        return Err(anyhow!("Snapshot has no users to benchmark with"));
    }
    let orchestrator = RecommendationOrchestrator::from_index(index, config);

    // Pick a random known user for each request
    let picks: Vec<String> = (0..requests)
        .map(|_| user_ids[rand::random_range(0..user_ids.len())].clone())
        .collect();

    // Requests run on the blocking pool, at most `concurrent` at a time
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();
    let mut handles = vec![];
    for user in picks {
        let orchestrator = orchestrator.clone();
        let permit = permits.clone().acquire_owned().await?;
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let start = Instant::now();
            orchestrator.compute_recommendations(&user, &EventFilter::default())?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings = vec![];
    for handle in handles {
        let elapsed = handle.await??;
        timings.push(elapsed);
    }
    let wall_time = wall_clock.elapsed();

    if timings.is_empty() {
        println!("No requests made");
        return Ok(());
    }

    let total_time: Duration = timings.iter().sum();
    let avg_latency = total_time / (timings.len() as u32);
    timings.sort();
    let percentile = |p: f64| {
        let rank = (timings.len() as f64 * p) as usize;
        timings[rank.min(timings.len() - 1)]
    };
    let throughput = requests as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print a ranked list of events
fn print_events(index: &EventIndex, events: &[Event], explain: bool) -> Result<()> {
    if events.is_empty() {
        println!("{}", "No matching events".yellow());
        return Ok(());
    }

    for (i, event) in events.iter().enumerate() {
        println!(
            "{}. {} @ {} - {}",
            (i + 1).to_string().green(),
            event.name.bold(),
            if event.location.is_empty() { "TBA" } else { event.location.as_str() },
            event.start_time.format("%a %b %e %H:%M UTC")
        );
        if explain {
            let categories = index.categories_of(event.id)?;
            println!(
                "   [{}] likes {} views {} trending {:.3}",
                categories.join(", "),
                event.liked_count,
                event.viewed_count,
                event.trending_score
            );
        }
    }
    Ok(())
}
