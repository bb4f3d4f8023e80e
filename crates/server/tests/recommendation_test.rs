//! End-to-end tests of the recommendation and trending services over an
//! in-memory catalog, with a frozen clock and seeded randomness.

use std::sync::Arc;

use catalog::{Category, Event, EventCatalog, EventFilter, EventId, EventIndex, User};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pipeline::RankingAggregator;
use scoring::{FixedClock, ScoreWeights, SeededRandom, max_popularity};
use server::{EngineConfig, RecommendationOrchestrator, TrendingService};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 16, 12, 0, 0).unwrap()
}

fn ids(events: &[Event]) -> Vec<EventId> {
    events.iter().map(|e| e.id).collect()
}

fn add_category(index: &EventIndex, id: u32, name: &str) {
    index
        .insert_category(Category {
            category_id: id,
            category_name: name.to_string(),
        })
        .unwrap();
}

/// 120 upcoming events, 10 past ones, three users
fn large_catalog() -> Arc<EventIndex> {
    let index = EventIndex::new();
    add_category(&index, 1, "music");
    add_category(&index, 2, "art");
    add_category(&index, 3, "sports");

    for id in 1..=130u32 {
        let start = if id <= 10 {
            now() - Duration::days(i64::from(id))
        } else {
            now() + Duration::hours(i64::from(id))
        };
        let event = Event::new(id, format!("Event {}", id), start).with_counts(id % 13, id % 29);
        index.insert_event(event).unwrap();
        index.assign_category(id, id % 3 + 1).unwrap();
    }

    for user in ["fan", "newcomer", "time_traveller"] {
        index.insert_user(User::new(user)).unwrap();
    }
    for (event_id, days_ago) in [(3, 2), (6, 9), (20, 30)] {
        index
            .like_event("fan", event_id, now() - Duration::days(days_ago))
            .unwrap();
    }
    index
        .like_event("time_traveller", 4, now() + Duration::days(5))
        .unwrap();

    Arc::new(index)
}

fn orchestrator(index: Arc<EventIndex>, config: &EngineConfig) -> RecommendationOrchestrator {
    RecommendationOrchestrator::from_index(index, config)
        .with_clock(Arc::new(FixedClock::new(now())))
}

fn trending(index: Arc<EventIndex>) -> TrendingService {
    TrendingService::from_index(index, &EngineConfig::default())
        .with_clock(Arc::new(FixedClock::new(now())))
}

#[test]
fn test_recommendations_bounded_and_upcoming() {
    let index = large_catalog();
    let orchestrator = orchestrator(index, &EngineConfig::default().with_seed(1));

    for user in ["fan", "newcomer", "time_traveller"] {
        let recs = orchestrator
            .compute_recommendations(user, &EventFilter::new())
            .unwrap();
        assert_eq!(recs.len(), 50, "user {}", user);
        assert!(recs.iter().all(|e| e.start_time > now()), "user {}", user);
    }
}

#[test]
fn test_unknown_user_returns_empty() {
    let orchestrator = orchestrator(large_catalog(), &EngineConfig::default());
    let recs = orchestrator
        .compute_recommendations("ghost", &EventFilter::new())
        .unwrap();
    assert!(recs.is_empty());
}

#[test]
fn test_cold_start_matches_direct_aggregation() {
    let index = large_catalog();
    let config = EngineConfig::default().with_seed(99);

    let via_orchestrator = orchestrator(index.clone(), &config)
        .compute_recommendations("newcomer", &EventFilter::new())
        .unwrap();

    let upcoming: Vec<Event> = index
        .fetch_events(&EventFilter::new(), now())
        .unwrap()
        .into_iter()
        .filter(|e| e.start_time > now())
        .collect();
    let max = max_popularity(&upcoming);
    let direct = RankingAggregator::default().rank(
        upcoming,
        None,
        max,
        ScoreWeights::new(0.0, 0.9, 0.1).unwrap(),
        &SeededRandom::new(99),
    );

    assert_eq!(ids(&via_orchestrator), ids(&direct));
}

#[test]
fn test_same_seed_is_reproducible() {
    let index = large_catalog();
    let config = EngineConfig::default().with_seed(2024);

    let first = orchestrator(index.clone(), &config)
        .compute_recommendations("fan", &EventFilter::new())
        .unwrap();
    let second = orchestrator(index, &config)
        .compute_recommendations("fan", &EventFilter::new())
        .unwrap();
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn test_shared_category_outranks_popularity() {
    let index = EventIndex::new();
    add_category(&index, 1, "music");
    add_category(&index, 2, "art");
    index.insert_user(User::new("fan")).unwrap();

    index
        .insert_event(Event::new(1, "Last Week's Gig", now() - Duration::days(7)))
        .unwrap();
    index
        .insert_event(Event::new(2, "Sound & Sculpture", now() + Duration::days(1)))
        .unwrap();
    index
        .insert_event(
            Event::new(3, "Blockbuster Fair", now() + Duration::days(1)).with_counts(50, 50),
        )
        .unwrap();
    index.assign_category(1, 1).unwrap();
    index.assign_category(2, 1).unwrap();
    index.assign_category(2, 2).unwrap();
    index.like_event("fan", 1, now() - Duration::days(7)).unwrap();

    let mut config = EngineConfig::default();
    config.diversity_probability = 0.0;
    let recs = orchestrator(Arc::new(index), &config)
        .compute_recommendations("fan", &EventFilter::new())
        .unwrap();

    // 0.7 * exp(-0.35) ≈ 0.493 against 0.2 * 1.0
    assert_eq!(ids(&recs), vec![2, 3]);
}

#[test]
fn test_popularity_scenario() {
    let index = EventIndex::new();
    for (id, likes, views) in [(1, 3, 2), (2, 1, 1), (3, 0, 0)] {
        let start = now() + Duration::days(1);
        let event = Event::new(id, format!("Event {}", id), start).with_counts(likes, views);
        index.insert_event(event).unwrap();
    }
    let index = Arc::new(index);

    trending(index.clone()).recalculate_trending_scores().unwrap();

    let scores: Vec<f64> = index
        .all_events()
        .unwrap()
        .iter()
        .map(|e| e.trending_score)
        .collect();
    assert_eq!(scores, vec![1.0, 0.4, 0.0]);
}

#[test]
fn test_trending_scores_bounded_and_monotone() {
    let index = large_catalog();
    let service = trending(index.clone());

    service.recalculate_trending_scores().unwrap();

    let events = index.all_events().unwrap();
    assert!(events.iter().all(|e| (0.0..=1.0).contains(&e.trending_score)));

    // Equal views, more likes: never a lower score
    for a in &events {
        for b in &events {
            if a.viewed_count == b.viewed_count && a.liked_count > b.liked_count {
                assert!(a.trending_score >= b.trending_score);
            }
        }
    }

    let top = service.fetch_trending_events(&EventFilter::new()).unwrap();
    assert_eq!(top.len(), 50);
    assert!(top.windows(2).all(|w| w[0].trending_score >= w[1].trending_score));
}

#[test]
fn test_trending_recalculation_after_likes_and_views() {
    let index = large_catalog();
    let service = trending(index.clone());

    index.insert_user(User::new("promoter")).unwrap();
    index.like_event("promoter", 11, now()).unwrap();
    for _ in 0..200 {
        index.record_view(11).unwrap();
    }
    service.recalculate_trending_scores().unwrap();

    let top = service.fetch_trending_events(&EventFilter::new()).unwrap();
    assert_eq!(top[0].id, 11);
    assert_eq!(top[0].trending_score, 1.0);
}

#[test]
fn test_all_zero_popularity_is_finite() {
    let index = EventIndex::new();
    for id in 1..=3 {
        index
            .insert_event(Event::new(id, "Quiet", now() + Duration::days(1)))
            .unwrap();
    }
    let index = Arc::new(index);

    trending(index.clone()).recalculate_trending_scores().unwrap();
    assert!(index.all_events().unwrap().iter().all(|e| e.trending_score == 0.0));
}

#[test]
fn test_clamp_future_likes_reaches_scorer() {
    let index = large_catalog();

    let unclamped = orchestrator(index.clone(), &EngineConfig::default())
        .user_profile("time_traveller")
        .unwrap()
        .unwrap();
    assert_eq!(unclamped.likes[0].days_since_like, -5);
    assert!(unclamped.likes[0].decay_weight > 1.0);

    let mut config = EngineConfig::default();
    config.clamp_future_likes = true;
    let clamped = orchestrator(index, &config)
        .user_profile("time_traveller")
        .unwrap()
        .unwrap();
    assert_eq!(clamped.likes[0].days_since_like, 0);
    assert_eq!(clamped.likes[0].decay_weight, 1.0);
    assert_eq!(clamped.category_weights[0].1, 1.0);
}

#[test]
fn test_far_future_like_with_zero_personal_weight() {
    let index = large_catalog();
    index.insert_user(User::new("mistyped_year")).unwrap();
    // exp(0.05 * ~14600 days) overflows to infinity
    index
        .like_event("mistyped_year", 12, now() + Duration::days(40 * 365))
        .unwrap();

    let mut config = EngineConfig::default().with_seed(5);
    config.personalized_weights = ScoreWeights::new(0.0, 0.9, 0.1).unwrap();
    let recs = orchestrator(index.clone(), &config)
        .compute_recommendations("mistyped_year", &EventFilter::new())
        .unwrap();

    // Same ranking as cold start: the personal component is switched off
    let cold = orchestrator(index, &config)
        .compute_recommendations("newcomer", &EventFilter::new())
        .unwrap();
    assert_eq!(recs.len(), 50);
    assert_eq!(ids(&recs), ids(&cold));
}
