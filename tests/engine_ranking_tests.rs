// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ranking property tests for the match engine.
//!
//! IMPORTANT: If these tests fail, it indicates breakage in the core
//! matching logic that users won't notice until their card stack is
//! ordered wrong.

use std::collections::HashSet;

use event_matcher::engine::{MatchEngine, MatchWeights};
use event_matcher::models::{
    EventFormat, EventRecord, Interest, LocationType, Occupation, Preferences,
};

fn make_event(id: &str, name: &str, organizer: &str, location_type: LocationType) -> EventRecord {
    EventRecord {
        id: id.to_string(),
        name: name.to_string(),
        start_at: "2025-06-15T09:00:00Z".to_string(),
        end_at: "2025-06-15T18:00:00Z".to_string(),
        location_type,
        city_state: Some("San Francisco, California".to_string()),
        cover_url: None,
        organizer_name: organizer.to_string(),
        organizer_avatar_url: None,
        organizer_description: None,
        url: None,
    }
}

/// A spread of events hitting different factors.
fn make_catalog() -> Vec<EventRecord> {
    vec![
        make_event("a", "Tech Innovation Summit", "Tech Events SF", LocationType::Offline),
        make_event("b", "Pottery for Beginners", "Clay Studio", LocationType::Offline),
        make_event("c", "Startup Pitch Night", "Founder Hub", LocationType::Offline),
        make_event("d", "Virtual Yoga Flow", "Wellness Co", LocationType::Online),
        make_event("e", "Community Mixer", "Neighbors", LocationType::Offline),
        make_event("f", "Intro to Programming Workshop", "Code Academy", LocationType::Online),
    ]
}

fn rich_preferences() -> Preferences {
    Preferences {
        display_name: None,
        occupation: Some(Occupation::Developer),
        interests: vec![Interest::Tech, Interest::Health, Interest::Networking],
        format: Some(EventFormat::Both),
        location: "San Francisco".to_string(),
        updated_at: None,
    }
}

#[test]
fn test_no_seen_event_survives_ranking() {
    let engine = MatchEngine::default();
    let catalog = make_catalog();
    let seen: HashSet<String> = ["a", "c", "e"].iter().map(|s| s.to_string()).collect();

    let ranked = engine.filter_and_rank(&catalog, &rich_preferences(), &seen);

    for scored in &ranked {
        assert!(!seen.contains(&scored.event.id), "seen event {} resurfaced", scored.event.id);
    }
    assert_eq!(ranked.len(), catalog.len() - seen.len());
}

#[test]
fn test_all_scores_bounded() {
    let engine = MatchEngine::default();
    let catalog = make_catalog();
    let prefs_variants = [
        Preferences::default(),
        rich_preferences(),
        Preferences {
            interests: Interest::ALL.to_vec(),
            format: Some(EventFormat::InPerson),
            location: "san".to_string(),
            occupation: Some(Occupation::Marketing),
            ..Default::default()
        },
    ];

    for prefs in &prefs_variants {
        for event in &catalog {
            let score = engine.score_event(event, prefs).match_score;
            assert!((0.0..=1.0 + 1e-9).contains(&score), "score {} out of bounds", score);
        }
    }
}

#[test]
fn test_ranking_is_descending() {
    let engine = MatchEngine::default();
    let ranked = engine.filter_and_rank(&make_catalog(), &rich_preferences(), &HashSet::new());

    for pair in ranked.windows(2) {
        assert!(pair[0].match_score >= pair[1].match_score);
    }
}

#[test]
fn test_ties_keep_catalog_order() {
    let engine = MatchEngine::default();
    // Empty preferences: every event scores 0, so ranking must return the
    // catalog order untouched.
    let catalog = make_catalog();
    let ranked = engine.filter_and_rank(&catalog, &Preferences::default(), &HashSet::new());

    let ranked_ids: Vec<&str> = ranked.iter().map(|s| s.event.id.as_str()).collect();
    let catalog_ids: Vec<&str> = catalog.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ranked_ids, catalog_ids);
    assert!(ranked.iter().all(|s| s.match_score == 0.0));
}

#[test]
fn test_repeated_ranking_is_deterministic() {
    let engine = MatchEngine::default();
    let catalog = make_catalog();
    let prefs = rich_preferences();

    let first: Vec<(String, f64)> = engine
        .filter_and_rank(&catalog, &prefs, &HashSet::new())
        .into_iter()
        .map(|s| (s.event.id, s.match_score))
        .collect();

    for _ in 0..5 {
        let again: Vec<(String, f64)> = engine
            .filter_and_rank(&catalog, &prefs, &HashSet::new())
            .into_iter()
            .map(|s| (s.event.id, s.match_score))
            .collect();
        assert_eq!(first, again);
    }
}

#[test]
fn test_occupation_match_is_binary() {
    let engine = MatchEngine::default();
    let mut prefs = Preferences::default();
    prefs.occupation = Some(Occupation::Designer);

    // One keyword hit and many keyword hits earn the same weight.
    let one_hit = make_event("a", "Design Talk", "Host", LocationType::Offline);
    let many_hits = make_event("b", "UX UI Graphic Design Art Visual", "Creative", LocationType::Offline);

    let weights = MatchWeights::default();
    assert_eq!(engine.score_event(&one_hit, &prefs).match_score, weights.occupation);
    assert_eq!(engine.score_event(&many_hits, &prefs).match_score, weights.occupation);
}

#[test]
fn test_format_preference_filters_by_location_type() {
    let engine = MatchEngine::default();
    let offline = make_event("a", "Dinner", "Host", LocationType::Offline);
    let online = make_event("b", "Webinar", "Host", LocationType::Online);

    let mut prefs = Preferences::default();
    prefs.format = Some(EventFormat::InPerson);
    assert!(engine.score_event(&offline, &prefs).match_details.format_match);
    assert!(!engine.score_event(&online, &prefs).match_details.format_match);

    prefs.format = Some(EventFormat::Virtual);
    assert!(!engine.score_event(&offline, &prefs).match_details.format_match);
    assert!(engine.score_event(&online, &prefs).match_details.format_match);

    prefs.format = Some(EventFormat::Both);
    assert!(engine.score_event(&offline, &prefs).match_details.format_match);
    assert!(engine.score_event(&online, &prefs).match_details.format_match);
}

#[test]
fn test_interest_labels_ordered_by_declaration() {
    let engine = MatchEngine::default();
    let event = make_event(
        "a",
        "Tech networking mixer for founders",
        "Startup Community",
        LocationType::Offline,
    );
    let mut prefs = Preferences::default();
    prefs.interests = vec![Interest::Networking, Interest::Tech, Interest::Health];

    let details = engine.score_event(&event, &prefs).match_details;
    assert_eq!(details.interests_matched, vec![Interest::Networking, Interest::Tech]);
}
