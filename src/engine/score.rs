// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Preference match scoring and catalog ranking.
//!
//! Scoring is a pure function of (event, preferences): four independent
//! factors, each contributing `weight * indicator` with the weights
//! summing to 1.0, so scores always land in [0, 1].

use std::collections::HashSet;

use crate::engine::keywords::{any_keyword_matches, interest_keywords, occupation_keywords};
use crate::models::{EventFormat, EventRecord, LocationType, MatchDetails, Preferences, ScoredEvent};

/// Factor weights. Defaults match the shipped configuration; custom
/// weights should still sum to 1.0 to keep scores bounded.
#[derive(Debug, Clone, Copy)]
pub struct MatchWeights {
    pub occupation: f64,
    pub interests: f64,
    pub location: f64,
    pub format: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            occupation: 0.2,
            interests: 0.4,
            location: 0.2,
            format: 0.2,
        }
    }
}

/// Scores events against user preferences and ranks the catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchEngine {
    weights: MatchWeights,
}

impl MatchEngine {
    pub fn new(weights: MatchWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> MatchWeights {
        self.weights
    }

    /// Score one event. Deterministic; empty preferences score 0.
    pub fn score_event(&self, event: &EventRecord, preferences: &Preferences) -> ScoredEvent {
        let mut score = 0.0;
        let mut details = MatchDetails::default();
        let text = event.searchable_text();

        // Format: "both" always earns credit, otherwise the preference
        // must match the event's online/offline flag exactly.
        if let Some(format) = preferences.format {
            let matches = match format {
                EventFormat::Both => true,
                EventFormat::InPerson => event.location_type == LocationType::Offline,
                EventFormat::Virtual => event.location_type == LocationType::Online,
            };
            if matches {
                score += self.weights.format;
                details.format_match = true;
            }
        }

        // Location: offline events only, case-insensitive substring of the
        // venue's city/state. Online events never earn location credit.
        if !preferences.location.is_empty() && event.location_type == LocationType::Offline {
            let event_location = event
                .city_state
                .as_deref()
                .unwrap_or_default()
                .to_lowercase();
            if event_location.contains(&preferences.location.to_lowercase()) {
                score += self.weights.location;
                details.location_match = true;
            }
        }

        // Interests: partial credit, matched count over declared count.
        if !preferences.interests.is_empty() {
            for interest in &preferences.interests {
                if any_keyword_matches(&text, interest_keywords(*interest)) {
                    details.interests_matched.push(*interest);
                }
            }
            if !details.interests_matched.is_empty() {
                score += self.weights.interests
                    * (details.interests_matched.len() as f64
                        / preferences.interests.len() as f64);
            }
        }

        // Occupation: binary, full weight or nothing.
        if let Some(occupation) = preferences.occupation {
            if any_keyword_matches(&text, occupation_keywords(occupation)) {
                score += self.weights.occupation;
                details.occupation_match = true;
            }
        }

        ScoredEvent {
            event: event.clone(),
            match_score: score,
            match_details: details,
        }
    }

    /// Exclude already-decided events, score the rest independently, and
    /// sort by score descending. The sort is stable: ties keep their
    /// original catalog order.
    pub fn filter_and_rank(
        &self,
        catalog: &[EventRecord],
        preferences: &Preferences,
        seen_ids: &HashSet<String>,
    ) -> Vec<ScoredEvent> {
        let mut scored: Vec<ScoredEvent> = catalog
            .iter()
            .filter(|event| !seen_ids.contains(&event.id))
            .map(|event| self.score_event(event, preferences))
            .collect();

        scored.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));

        tracing::debug!(
            total = catalog.len(),
            seen = seen_ids.len(),
            remaining = scored.len(),
            "Catalog filtered and ranked"
        );
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Interest;

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

    fn tech_prefs() -> Preferences {
        Preferences {
            interests: vec![Interest::Tech],
            format: Some(EventFormat::Both),
            ..Default::default()
        }
    }

    #[test]
    fn test_reference_scenario_scores_point_six() {
        // interests 0.4 * (1/1) + format 0.2; location and occupation
        // contribute nothing.
        let engine = MatchEngine::default();
        let event = make_event(
            "evt-1",
            "Tech Innovation Summit 2025",
            "Tech Events SF",
            LocationType::Offline,
        );

        let scored = engine.score_event(&event, &tech_prefs());

        assert!((scored.match_score - 0.6).abs() < 1e-9);
        assert_eq!(scored.match_details.interests_matched, vec![Interest::Tech]);
        assert!(scored.match_details.format_match);
        assert!(!scored.match_details.location_match);
        assert!(!scored.match_details.occupation_match);
    }

    #[test]
    fn test_empty_preferences_score_zero() {
        let engine = MatchEngine::default();
        let event = make_event("evt-1", "Anything", "Anyone", LocationType::Online);

        let scored = engine.score_event(&event, &Preferences::default());

        assert_eq!(scored.match_score, 0.0);
        assert_eq!(scored.match_details, MatchDetails::default());
    }

    #[test]
    fn test_score_is_deterministic() {
        let engine = MatchEngine::default();
        let event = make_event("evt-1", "Tech Meetup", "Devs", LocationType::Offline);
        let prefs = tech_prefs();

        let first = engine.score_event(&event, &prefs).match_score;
        for _ in 0..10 {
            assert_eq!(engine.score_event(&event, &prefs).match_score, first);
        }
    }

    #[test]
    fn test_online_event_earns_no_location_credit() {
        let engine = MatchEngine::default();
        let mut prefs = Preferences::default();
        prefs.location = "San Francisco".to_string();

        let online = make_event("evt-1", "Webinar", "Host", LocationType::Online);
        assert_eq!(engine.score_event(&online, &prefs).match_score, 0.0);

        let offline = make_event("evt-2", "Meetup", "Host", LocationType::Offline);
        let scored = engine.score_event(&offline, &prefs);
        assert!((scored.match_score - 0.2).abs() < 1e-9);
        assert!(scored.match_details.location_match);
    }

    #[test]
    fn test_partial_interest_credit() {
        let engine = MatchEngine::default();
        let mut prefs = Preferences::default();
        prefs.interests = vec![Interest::Tech, Interest::Health];

        // Only "tech" keywords present: 0.4 * 1/2.
        let event = make_event("evt-1", "Software Meetup", "Host", LocationType::Offline);
        let scored = engine.score_event(&event, &prefs);
        assert!((scored.match_score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_filter_excludes_seen_and_sorts_stably() {
        let engine = MatchEngine::default();
        let catalog = vec![
            make_event("a", "Quiet Dinner", "Host", LocationType::Offline),
            make_event("b", "Tech Night", "Host", LocationType::Offline),
            make_event("c", "Also Quiet", "Host", LocationType::Offline),
            make_event("d", "Tech Day", "Host", LocationType::Offline),
        ];
        let mut prefs = Preferences::default();
        prefs.interests = vec![Interest::Tech];

        let seen: HashSet<String> = ["d".to_string()].into();
        let ranked = engine.filter_and_rank(&catalog, &prefs, &seen);

        let ids: Vec<&str> = ranked.iter().map(|s| s.event.id.as_str()).collect();
        // "b" scores highest; zero-scored "a" and "c" keep catalog order;
        // "d" is excluded as seen.
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_scores_stay_bounded() {
        let engine = MatchEngine::default();
        let event = make_event(
            "evt-1",
            "Tech startup art network workshop wellness",
            "Founder hackathon design community",
            LocationType::Offline,
        );
        let prefs = Preferences {
            display_name: None,
            occupation: Some(crate::models::Occupation::Developer),
            interests: Interest::ALL.to_vec(),
            format: Some(EventFormat::Both),
            location: "san francisco".to_string(),
            updated_at: None,
        };

        let scored = engine.score_event(&event, &prefs);
        assert!(scored.match_score >= 0.0 && scored.match_score <= 1.0 + 1e-9);
    }
}
