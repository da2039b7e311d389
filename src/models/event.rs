// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Event catalog models.

use serde::{Deserialize, Serialize};

use crate::models::preferences::Interest;

/// Base URL for resolving event page slugs.
const EVENT_PAGE_BASE: &str = "https://lu.ma";

/// A catalog event, flattened from the scraper dataset item.
///
/// Read-only external data; a value snapshot of this struct is embedded in
/// every stored match, so later catalog changes never alter match history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Stable external key (`api_id` in the dataset).
    pub id: String,
    /// Event name/title.
    pub name: String,
    /// Start instant (ISO 8601).
    pub start_at: String,
    /// End instant (ISO 8601).
    pub end_at: String,
    /// Whether the event happens online or at a venue.
    pub location_type: LocationType,
    /// "City, State" for offline events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_state: Option<String>,
    /// Cover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Hosting calendar/organizer name.
    pub organizer_name: String,
    /// Organizer avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer_avatar_url: Option<String>,
    /// Short organizer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer_description: Option<String>,
    /// Event page slug or absolute URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl EventRecord {
    /// Text searched by the keyword matchers: event name, organizer name,
    /// and organizer description, lowercased.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name,
            self.organizer_name,
            self.organizer_description.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    }

    /// Absolute event page URL, resolving bare slugs against lu.ma.
    pub fn external_url(&self) -> Option<String> {
        self.url.as_deref().map(|u| {
            if u.starts_with("http://") || u.starts_with("https://") {
                u.to_string()
            } else {
                format!("{}/{}", EVENT_PAGE_BASE, u.trim_start_matches('/'))
            }
        })
    }
}

/// Where an event takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Online,
    Offline,
    /// Anything else the scraper emits. Only matches the "both" format
    /// preference and never contributes to location score.
    #[serde(other)]
    Unknown,
}

/// Per-factor breakdown of how an event matched the preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    pub occupation_match: bool,
    pub interests_matched: Vec<Interest>,
    pub location_match: bool,
    pub format_match: bool,
}

/// An event with its computed preference match score.
///
/// Derived, recomputed every ranking pass; never persisted standalone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEvent {
    #[serde(flatten)]
    pub event: EventRecord,
    /// Weighted factor sum, always in [0, 1].
    pub match_score: f64,
    pub match_details: MatchDetails,
}

/// Contextual sub-scores computed by the recommendation enhancer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SecondaryScores {
    pub availability: f64,
    pub social: f64,
    pub timing: f64,
    pub trending: f64,
    pub personalization: f64,
    /// Fixed weighted sum of the five sub-scores.
    pub total: f64,
}

/// A scored event after the optional second-pass re-ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedEvent {
    #[serde(flatten)]
    pub scored: ScoredEvent,
    pub secondary: SecondaryScores,
    /// Final ordering key: 0.6 x match score + 0.4 x secondary total.
    pub final_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event() -> EventRecord {
        EventRecord {
            id: "evt-1".to_string(),
            name: "Tech Summit".to_string(),
            start_at: "2025-06-15T09:00:00Z".to_string(),
            end_at: "2025-06-15T18:00:00Z".to_string(),
            location_type: LocationType::Offline,
            city_state: Some("San Francisco, California".to_string()),
            cover_url: None,
            organizer_name: "Tech Events SF".to_string(),
            organizer_avatar_url: None,
            organizer_description: Some("Innovators welcome".to_string()),
            url: Some("tech-summit".to_string()),
        }
    }

    #[test]
    fn test_searchable_text_is_lowercase() {
        let event = make_event();
        let text = event.searchable_text();
        assert!(text.contains("tech summit"));
        assert!(text.contains("tech events sf"));
        assert!(text.contains("innovators welcome"));
    }

    #[test]
    fn test_external_url_resolves_slug() {
        let event = make_event();
        assert_eq!(
            event.external_url().as_deref(),
            Some("https://lu.ma/tech-summit")
        );
    }

    #[test]
    fn test_external_url_keeps_absolute() {
        let mut event = make_event();
        event.url = Some("https://example.com/e/1".to_string());
        assert_eq!(
            event.external_url().as_deref(),
            Some("https://example.com/e/1")
        );
    }

    #[test]
    fn test_unknown_location_type_deserializes() {
        let record: LocationType = serde_json::from_str("\"hybrid\"").unwrap();
        assert_eq!(record, LocationType::Unknown);
    }
}
