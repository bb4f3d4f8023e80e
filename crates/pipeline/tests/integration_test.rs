//! Integration tests for the pipeline.
//!
//! These tests run the catalog, the scorers and the ranking stage together
//! the way a request does, without the orchestrator on top.

use catalog::{
    Category, CategoryIndex, Event, EventCatalog, EventFilter, EventIndex, LikeHistoryStore, User,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pipeline::filters::FutureEventsFilter;
use pipeline::{FilterContext, FilterPipeline, RankingAggregator};
use scoring::{
    DiversityInjector, PersonalAffinityScorer, ScoreWeights, SeededRandom, group_categories,
    max_popularity,
};
use std::collections::HashMap;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 16, 12, 0, 0).unwrap()
}

fn create_test_setup() -> EventIndex {
    let index = EventIndex::new();

    index.insert_user(User::new("fan")).unwrap();
    for (category_id, name) in [(1, "music"), (2, "art")] {
        index
            .insert_category(Category {
                category_id,
                category_name: name.to_string(),
            })
            .unwrap();
    }

    // Event 1: liked last week, already over
    index
        .insert_event(Event::new(1, "Spring Concert", now() - Duration::days(7)).with_counts(5, 0))
        .unwrap();
    // Event 2: upcoming, music and art
    index
        .insert_event(
            Event::new(2, "Sound & Sculpture", now() + Duration::days(2)).with_counts(2, 0),
        )
        .unwrap();
    // Event 3: upcoming, no categories, unpopular
    index
        .insert_event(Event::new(3, "Study Break", now() + Duration::days(1)))
        .unwrap();
    // Event 4: upcoming art show, popular
    index
        .insert_event(Event::new(4, "Gallery Night", now() + Duration::days(3)).with_counts(4, 6))
        .unwrap();

    index.assign_category(1, 1).unwrap();
    index.assign_category(2, 1).unwrap();
    index.assign_category(2, 2).unwrap();
    index.assign_category(4, 2).unwrap();

    index.like_event("fan", 1, now() - Duration::days(7)).unwrap();
    index
}

fn upcoming(index: &EventIndex) -> Vec<Event> {
    let events = index.fetch_events(&EventFilter::new(), now()).unwrap();
    FilterPipeline::new()
        .add_filter(FutureEventsFilter)
        .apply(events, &FilterContext::new(now()))
        .unwrap()
}

#[test]
fn test_personal_score_for_shared_category() {
    let index = create_test_setup();
    let candidates = upcoming(&index);
    let likes = index.like_entries("fan").unwrap();

    let mut ids: Vec<u32> = candidates.iter().map(|e| e.id).collect();
    ids.extend(likes.iter().map(|l| l.event_id));
    let categories = group_categories(&index.categories_for_events(&ids).unwrap());

    let scores = PersonalAffinityScorer::new().score(&likes, &candidates, &categories, now());

    // Only "music" matches, so event 2 averages over that single category
    assert!((scores[&2] - (-0.35f64).exp()).abs() < 1e-12);
    assert!(!scores.contains_key(&3));
    assert!(!scores.contains_key(&4));
}

#[test]
fn test_full_ranking_only_upcoming_and_bounded() {
    let index = create_test_setup();
    for id in 10..80 {
        index
            .insert_event(Event::new(
                id,
                format!("Filler {}", id),
                now() + Duration::hours(i64::from(id)),
            ))
            .unwrap();
    }

    let candidates = upcoming(&index);
    let max = max_popularity(&candidates);
    let ranked = RankingAggregator::default().rank(
        candidates,
        None,
        max,
        ScoreWeights::COLD_START,
        &SeededRandom::new(5),
    );

    assert!(ranked.len() <= 50);
    assert!(ranked.iter().all(|e| e.start_time > now()));
    assert!(!ranked.iter().any(|e| e.id == 1));
}

#[test]
fn test_personalized_ranking_prefers_affinity() {
    let index = create_test_setup();
    let candidates = upcoming(&index);
    let likes = index.like_entries("fan").unwrap();
    let ids: Vec<u32> = candidates.iter().map(|e| e.id).chain([1]).collect();
    let categories = group_categories(&index.categories_for_events(&ids).unwrap());
    let personal: HashMap<u32, f64> =
        PersonalAffinityScorer::new().score(&likes, &candidates, &categories, now());

    let max = max_popularity(&candidates);
    let ranked = RankingAggregator::new(DiversityInjector::new().with_probability(0.0)).rank(
        candidates,
        Some(&personal),
        max,
        ScoreWeights::PERSONALIZED,
        &SeededRandom::new(5),
    );

    // 0.7 * 0.705 + 0.2 * 0.2 beats 0.2 * 1.0
    let order: Vec<u32> = ranked.iter().map(|e| e.id).collect();
    assert_eq!(order, vec![2, 4, 3]);
}

#[test]
fn test_trending_normalization_over_upcoming() {
    let index = create_test_setup();
    let candidates = upcoming(&index);

    // Popularities 2, 0, 10 in id order
    assert_eq!(max_popularity(&candidates), 10);
    let scores: Vec<f64> = candidates
        .iter()
        .map(|e| scoring::trending_score(e, 10))
        .collect();
    assert_eq!(scores, vec![0.2, 0.0, 1.0]);
}
