// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session orchestration: auth -> preferences -> browse -> decide.
//!
//! Drives the screen state machine and the ranked card queue. Each
//! decision is atomic with respect to the store: seen/match writes land
//! before the next card becomes current, and analytics delivery is
//! queue-only on this path so it can never block or roll back a storage
//! mutation.

use chrono::Utc;
use std::collections::{HashSet, VecDeque};

use crate::engine::{
    MatchEngine, NullSignals, RecommendationEnhancer, SignalProvider,
};
use crate::models::{EventRecord, Match, Preferences, ScoredEvent, UserIdentity};
use crate::services::AnalyticsSink;
use crate::store::UserStore;

/// Cards kept visible in the stack at once.
pub const VISIBLE_WINDOW: usize = 3;

/// Which screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Unauthenticated,
    PreferencesNeeded,
    Browsing,
    ViewingMatches,
}

/// A swipe outcome on one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Pass,
    Like,
    SuperLike,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Pass => "pass",
            Decision::Like => "like",
            Decision::SuperLike => "super-like",
        }
    }

    /// Like and super-like create a match record.
    pub fn is_match(&self) -> bool {
        matches!(self, Decision::Like | Decision::SuperLike)
    }
}

/// Orchestrates one user session.
pub struct SessionController {
    store: UserStore,
    engine: MatchEngine,
    enhancer: RecommendationEnhancer,
    signals: Box<dyn SignalProvider>,
    analytics: AnalyticsSink,
    screen: Screen,
    catalog: Vec<EventRecord>,
    queue: VecDeque<ScoredEvent>,
    window: VecDeque<ScoredEvent>,
}

impl SessionController {
    pub fn new(store: UserStore, engine: MatchEngine, analytics: AnalyticsSink) -> Self {
        Self {
            store,
            engine,
            enhancer: RecommendationEnhancer,
            signals: Box::new(NullSignals),
            analytics,
            screen: Screen::Loading,
            catalog: Vec::new(),
            queue: VecDeque::new(),
            window: VecDeque::new(),
        }
    }

    /// Swap in a context signal provider for the recommendation pass.
    pub fn with_signals(mut self, signals: Box<dyn SignalProvider>) -> Self {
        self.signals = signals;
        self
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Session start: migrate legacy data, count the session, and route by
    /// authentication result.
    pub fn initialize(&mut self, user: Option<UserIdentity>) {
        // Persist the identity first so migration and the session counter
        // land in the right user namespace.
        if let Some(user) = &user {
            self.store.save_user(user);
        }
        self.store.migrate_legacy_data();
        self.store.record_session();
        self.analytics
            .set_user_context(&self.store.resolve_user_id(), user.as_ref());
        self.analytics.track_session_start();

        match user {
            Some(user) => self.handle_authenticated(user),
            None => self.screen = Screen::Unauthenticated,
        }
    }

    /// Consume an "authenticated" notification from the identity provider.
    pub fn handle_authenticated(&mut self, user: UserIdentity) {
        self.store.save_user(&user);
        self.analytics
            .set_user_context(&self.store.resolve_user_id(), Some(&user));
        self.analytics.track_authentication(&user);

        if self.store.preferences().is_some() {
            self.start_browsing();
        } else {
            self.screen = Screen::PreferencesNeeded;
        }
    }

    /// Install a loaded catalog. The latest successful load wins; an
    /// active browsing queue is re-ranked against it.
    pub fn set_catalog(&mut self, events: Vec<EventRecord>) {
        self.catalog = events;
        if self.screen == Screen::Browsing {
            self.start_browsing();
        }
    }

    pub fn save_preferences(&mut self, preferences: &Preferences) {
        self.store.save_preferences(preferences);
        self.analytics.track_preferences_update(preferences);
        self.start_browsing();
    }

    /// Skip the preferences form; browsing ranks against empty preferences.
    pub fn skip_preferences(&mut self) {
        self.start_browsing();
    }

    // ─── Browsing ────────────────────────────────────────────────

    /// Rank the catalog and materialize the initial card window.
    pub fn start_browsing(&mut self) {
        let preferences = self.store.preferences().unwrap_or_default();
        let seen: HashSet<String> = self.store.seen_events().into_iter().collect();

        let ranked = self.engine.filter_and_rank(&self.catalog, &preferences, &seen);

        let ai_enabled = self
            .store
            .ai_preferences()
            .map(|ai| ai.allow_recommendations)
            .unwrap_or(false);

        let ordered: Vec<ScoredEvent> = if ai_enabled {
            let context = RecommendationEnhancer::gather_context(
                self.signals.as_ref(),
                &ranked,
                self.store.matches(),
            );
            self.enhancer
                .enhance(ranked, &context, Utc::now())
                .into_iter()
                .map(|enhanced| enhanced.scored)
                .collect()
        } else {
            ranked
        };

        self.queue = ordered.into();
        self.window.clear();
        self.refill_window();
        self.screen = Screen::Browsing;
    }

    fn refill_window(&mut self) {
        while self.window.len() < VISIBLE_WINDOW {
            match self.queue.pop_front() {
                Some(card) => self.window.push_back(card),
                None => break,
            }
        }
    }

    /// The card currently on top of the stack.
    pub fn current_card(&self) -> Option<&ScoredEvent> {
        self.window.front()
    }

    /// All currently visible cards, top first.
    pub fn visible_cards(&self) -> impl Iterator<Item = &ScoredEvent> {
        self.window.iter()
    }

    /// Undecided events left in this session (visible + queued).
    pub fn remaining(&self) -> usize {
        self.window.len() + self.queue.len()
    }

    /// Apply a decision to the top card.
    ///
    /// Storage writes happen before the window refills: the decision is
    /// always recorded as seen, and like/super-like also records a match.
    /// Returns the decided card, or `None` when the stack is empty.
    pub fn decide(&mut self, decision: Decision) -> Option<ScoredEvent> {
        let card = self.window.pop_front()?;

        self.store.add_seen_event(&card.event.id);
        if decision.is_match() {
            self.store.add_match(&card.event);
            self.analytics.track_match(&card.event, decision);
        }
        self.analytics.track_event_seen(&card.event, decision);

        self.refill_window();
        if self.remaining() == 0 {
            tracing::info!("No more events to show");
        }
        Some(card)
    }

    // ─── Navigation ──────────────────────────────────────────────

    pub fn view_matches(&mut self) -> Vec<Match> {
        self.screen = Screen::ViewingMatches;
        self.store.matches()
    }

    pub fn back_to_browsing(&mut self) {
        self.screen = Screen::Browsing;
    }

    /// Drop the identity and return to the unauthenticated screen. The
    /// user's stored history is kept; `UserStore::clear_all` is the wipe.
    pub fn sign_out(&mut self) {
        self.store.remove_user();
        self.queue.clear();
        self.window.clear();
        self.screen = Screen::Unauthenticated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_labels() {
        assert_eq!(Decision::Pass.as_str(), "pass");
        assert_eq!(Decision::Like.as_str(), "like");
        assert_eq!(Decision::SuperLike.as_str(), "super-like");
        assert!(!Decision::Pass.is_match());
        assert!(Decision::Like.is_match());
        assert!(Decision::SuperLike.is_match());
    }
}
