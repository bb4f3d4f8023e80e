//! Benchmarks for the scoring components
//!
//! Run with: cargo bench --package scoring
//!
//! Uses a synthetic catalog of 5,000 events spread over 12 categories and a
//! user with 200 likes.

use catalog::{CategoryLabel, Event, EventCategory, EventId, LikeEntry};
use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use scoring::{
    DiversityInjector, PersonalAffinityScorer, SeededRandom, TrendingScorer, group_categories,
    max_popularity, trending_score,
};
use std::collections::HashMap;

const EVENTS: u32 = 5_000;
const CATEGORIES: u32 = 12;
const LIKES: u32 = 200;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 16, 12, 0, 0).unwrap()
}

fn synthetic_events() -> Vec<Event> {
    (1..=EVENTS)
        .map(|id| {
            let start = now() + Duration::hours(i64::from(id));
            let mut event =
                Event::new(id, format!("Event {}", id), start).with_counts(id % 97, id % 389);
            event.trending_score = f64::from(id % 101) / 100.0;
            event
        })
        .collect()
}

fn synthetic_categories() -> HashMap<EventId, Vec<CategoryLabel>> {
    let rows: Vec<EventCategory> = (1..=EVENTS)
        .flat_map(|id| {
            [id % CATEGORIES, (id * 7) % CATEGORIES].map(|c| EventCategory {
                event_id: id,
                category: format!("category-{}", c),
            })
        })
        .collect();
    group_categories(&rows)
}

fn synthetic_likes() -> Vec<LikeEntry> {
    (1..=LIKES)
        .map(|i| LikeEntry {
            event_id: i * 13 % EVENTS + 1,
            timestamp: now() - Duration::days(i64::from(i % 60)),
        })
        .collect()
}

fn bench_personal_affinity(c: &mut Criterion) {
    let events = synthetic_events();
    let categories = synthetic_categories();
    let likes = synthetic_likes();
    let scorer = PersonalAffinityScorer::new();

    c.bench_function("personal_affinity_score", |b| {
        b.iter(|| {
            let scores = scorer.score(
                black_box(&likes),
                black_box(&events),
                black_box(&categories),
                now(),
            );
            black_box(scores)
        })
    });
}

fn bench_trending(c: &mut Criterion) {
    let events = synthetic_events();

    c.bench_function("trending_normalize", |b| {
        b.iter(|| {
            let max = max_popularity(black_box(&events));
            let total: f64 = events.iter().map(|e| trending_score(e, max)).sum();
            black_box(total)
        })
    });

    c.bench_function("trending_fetch_top", |b| {
        let scorer = TrendingScorer::new();
        b.iter(|| black_box(scorer.fetch(black_box(events.clone()))))
    });
}

fn bench_diversity(c: &mut Criterion) {
    let injector = DiversityInjector::new();
    let random = SeededRandom::new(42);

    c.bench_function("diversity_boost", |b| {
        b.iter(|| black_box(injector.boost(&random)))
    });
}

criterion_group!(benches, bench_personal_affinity, bench_trending, bench_diversity);
criterion_main!(benches);
