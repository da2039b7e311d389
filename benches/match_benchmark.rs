use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashSet;

use event_matcher::engine::MatchEngine;
use event_matcher::models::{
    EventFormat, EventRecord, Interest, LocationType, Occupation, Preferences,
};

/// Build a realistic mixed catalog by cycling name/organizer templates.
fn make_catalog(count: usize) -> Vec<EventRecord> {
    let templates = [
        ("Tech Innovation Summit", "Tech Events SF", LocationType::Offline),
        ("Startup Pitch Night", "Founder Hub", LocationType::Offline),
        ("Virtual Design Workshop", "Creative Minds", LocationType::Online),
        ("Community Wellness Mixer", "Neighbors", LocationType::Offline),
        ("Growth Marketing Seminar", "Digital Lab", LocationType::Online),
    ];

    (0..count)
        .map(|i| {
            let (name, organizer, location_type) = templates[i % templates.len()];
            EventRecord {
                id: format!("evt-{}", i),
                name: format!("{} {}", name, i),
                start_at: "2025-06-15T09:00:00Z".to_string(),
                end_at: "2025-06-15T18:00:00Z".to_string(),
                location_type,
                city_state: Some("San Francisco, California".to_string()),
                cover_url: None,
                organizer_name: organizer.to_string(),
                organizer_avatar_url: None,
                organizer_description: Some("Bringing people together".to_string()),
                url: None,
            }
        })
        .collect()
}

fn benchmark_scoring(c: &mut Criterion) {
    let engine = MatchEngine::default();
    let catalog = make_catalog(1000);
    let preferences = Preferences {
        display_name: None,
        occupation: Some(Occupation::Developer),
        interests: vec![Interest::Tech, Interest::Networking, Interest::Health],
        format: Some(EventFormat::Both),
        location: "San Francisco".to_string(),
        updated_at: None,
    };

    // Half the catalog already decided, the realistic steady state.
    let seen: HashSet<String> = (0..500).map(|i| format!("evt-{}", i * 2)).collect();

    let mut group = c.benchmark_group("match_engine");

    group.bench_function("score_single_event", |b| {
        b.iter(|| engine.score_event(black_box(&catalog[0]), black_box(&preferences)))
    });

    group.bench_function("filter_and_rank_1000", |b| {
        b.iter(|| engine.filter_and_rank(black_box(&catalog), black_box(&preferences), &seen))
    });

    group.finish();
}

criterion_group!(benches, benchmark_scoring);
criterion_main!(benches);
