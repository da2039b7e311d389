// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Optional second-pass re-ranking with contextual signals.
//!
//! Blends the primary match score with availability, social, timing,
//! trending, and personalization sub-scores. Every contextual input has an
//! explicit unknown state that contributes zero for that sub-score only;
//! a missing signal never fails the pass.

use chrono::{DateTime, Datelike, Timelike, Utc};
use rand::Rng;
use std::collections::{HashMap, HashSet};

use crate::models::event::SecondaryScores;
use crate::models::{EnhancedEvent, Match, ScoredEvent};

/// Weight of the primary match score in the final ordering key.
const PRIMARY_WEIGHT: f64 = 0.6;
/// Weight of the secondary (contextual) score in the final ordering key.
const SECONDARY_WEIGHT: f64 = 0.4;

/// Contextual inputs for one enhancement pass. Absent map entries mean
/// "unknown" for that event.
#[derive(Debug, Clone, Default)]
pub struct EnhancementContext {
    /// Event id to calendar availability (true = free, false = busy).
    pub availability: HashMap<String, bool>,
    /// Event id to number of friends attending.
    pub friends_attending: HashMap<String, u32>,
    /// Event id to community interest level (0..=100).
    pub community_interest: HashMap<String, u32>,
    /// Past like/super-like decisions, newest first.
    pub match_history: Vec<Match>,
}

/// Pluggable source of contextual signals. The default methods return the
/// unknown state, so a unit struct is a valid no-op provider.
pub trait SignalProvider {
    fn availability(&self, _events: &[ScoredEvent]) -> HashMap<String, bool> {
        HashMap::new()
    }

    fn friends_attending(&self, _events: &[ScoredEvent]) -> HashMap<String, u32> {
        HashMap::new()
    }

    fn community_interest(&self, _events: &[ScoredEvent]) -> HashMap<String, u32> {
        HashMap::new()
    }
}

/// Provider that answers with nothing; enhancement degrades to timing and
/// personalization only.
pub struct NullSignals;

impl SignalProvider for NullSignals {}

/// Randomized stand-in for the calendar/social integrations.
///
/// No real external service is wired up; the distributions only need to
/// stay within the documented contribution ranges.
pub struct SimulatedSignals {
    now: DateTime<Utc>,
}

impl SimulatedSignals {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl SignalProvider for SimulatedSignals {
    fn availability(&self, events: &[ScoredEvent]) -> HashMap<String, bool> {
        let mut rng = rand::thread_rng();

        // A handful of random 2-hour busy slots over the next 30 days.
        let busy_slots: Vec<(DateTime<Utc>, DateTime<Utc>)> = (0..5)
            .map(|_| {
                let start = self.now + chrono::Duration::minutes(rng.gen_range(0..30 * 24 * 60));
                (start, start + chrono::Duration::hours(2))
            })
            .collect();

        events
            .iter()
            .filter_map(|scored| {
                let start = parse_instant(&scored.event.start_at)?;
                let end = parse_instant(&scored.event.end_at).unwrap_or(start);
                let busy = busy_slots.iter().any(|(busy_start, busy_end)| {
                    (start >= *busy_start && start < *busy_end)
                        || (end > *busy_start && end <= *busy_end)
                });
                Some((scored.event.id.clone(), !busy))
            })
            .collect()
    }

    fn friends_attending(&self, events: &[ScoredEvent]) -> HashMap<String, u32> {
        let mut rng = rand::thread_rng();
        events
            .iter()
            .take(10)
            .filter_map(|scored| {
                if rng.gen_bool(0.4) {
                    Some((scored.event.id.clone(), rng.gen_range(1..=5)))
                } else {
                    None
                }
            })
            .collect()
    }

    fn community_interest(&self, events: &[ScoredEvent]) -> HashMap<String, u32> {
        let mut rng = rand::thread_rng();
        events
            .iter()
            .map(|scored| (scored.event.id.clone(), rng.gen_range(0..100)))
            .collect()
    }
}

/// Second-pass re-ranker.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationEnhancer;

impl RecommendationEnhancer {
    /// Collect a context from a provider plus the stored match history.
    pub fn gather_context<P: SignalProvider + ?Sized>(
        provider: &P,
        events: &[ScoredEvent],
        match_history: Vec<Match>,
    ) -> EnhancementContext {
        EnhancementContext {
            availability: provider.availability(events),
            friends_attending: provider.friends_attending(events),
            community_interest: provider.community_interest(events),
            match_history,
        }
    }

    /// Re-rank scored events by `0.6 x match score + 0.4 x secondary`.
    /// Stable on ties; input order is the primary ranking order.
    pub fn enhance(
        &self,
        scored: Vec<ScoredEvent>,
        context: &EnhancementContext,
        now: DateTime<Utc>,
    ) -> Vec<EnhancedEvent> {
        let patterns = HistoryPatterns::from_matches(&context.match_history);

        let mut enhanced: Vec<EnhancedEvent> = scored
            .into_iter()
            .map(|scored| {
                let secondary = self.secondary_scores(&scored, context, &patterns, now);
                let final_score =
                    scored.match_score * PRIMARY_WEIGHT + secondary.total * SECONDARY_WEIGHT;
                EnhancedEvent {
                    scored,
                    secondary,
                    final_score,
                }
            })
            .collect();

        enhanced.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
        enhanced
    }

    fn secondary_scores(
        &self,
        scored: &ScoredEvent,
        context: &EnhancementContext,
        patterns: &HistoryPatterns,
        now: DateTime<Utc>,
    ) -> SecondaryScores {
        let event_id = &scored.event.id;

        let availability = match context.availability.get(event_id) {
            Some(true) => 1.0,
            Some(false) => 0.2,
            None => 0.0,
        };

        let social = context
            .friends_attending
            .get(event_id)
            .map(|&count| (count as f64 * 0.2).min(1.0))
            .unwrap_or(0.0);

        let timing = match parse_instant(&scored.event.start_at) {
            Some(start) => {
                let days_until = (start - now).num_days();
                if days_until <= 7 {
                    1.0
                } else if days_until <= 30 {
                    0.7
                } else {
                    0.4
                }
            }
            None => 0.4,
        };

        let trending = context
            .community_interest
            .get(event_id)
            .map(|&interest| (interest as f64 / 100.0).min(1.0))
            .unwrap_or(0.0);

        let personalization = patterns.score(&scored.event.start_at, &scored.event.organizer_name);

        let total = availability * 0.3
            + social * 0.2
            + timing * 0.2
            + trending * 0.15
            + personalization * 0.15;

        SecondaryScores {
            availability,
            social,
            timing,
            trending,
            personalization,
            total,
        }
    }
}

/// Recurring day-of-week / hour / organizer signals from match history.
struct HistoryPatterns {
    preferred_days: HashSet<u32>,
    preferred_hours: HashSet<u32>,
    preferred_organizers: HashSet<String>,
}

impl HistoryPatterns {
    fn from_matches(matches: &[Match]) -> Self {
        let mut preferred_days = HashSet::new();
        let mut preferred_hours = HashSet::new();
        let mut preferred_organizers = HashSet::new();

        for m in matches {
            if let Some(start) = parse_instant(&m.event.start_at) {
                preferred_days.insert(start.weekday().num_days_from_sunday());
                preferred_hours.insert(start.hour());
            }
            preferred_organizers.insert(m.event.organizer_name.clone());
        }

        Self {
            preferred_days,
            preferred_hours,
            preferred_organizers,
        }
    }

    /// Each recurring signal contributes fixed partial credit, capped at 1.
    fn score(&self, start_at: &str, organizer: &str) -> f64 {
        let mut score: f64 = 0.0;

        if let Some(start) = parse_instant(start_at) {
            if self
                .preferred_days
                .contains(&start.weekday().num_days_from_sunday())
            {
                score += 0.3;
            }
            if self.preferred_hours.contains(&start.hour()) {
                score += 0.3;
            }
        }

        if self.preferred_organizers.contains(organizer) {
            score += 0.4;
        }

        score.min(1.0)
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
