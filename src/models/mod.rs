// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod event;
pub mod preferences;
pub mod user;
pub mod user_data;

pub use event::{
    EnhancedEvent, EventRecord, LocationType, MatchDetails, ScoredEvent, SecondaryScores,
};
pub use preferences::{AiPreferences, EventFormat, Interest, Occupation, Preferences, PrivacyLevel};
pub use user::{Provider, UserIdentity};
pub use user_data::{
    AuthorizationStatus, DayStats, Match, PendingAuthorization, Snapshot, StorageStats, UserData,
};
