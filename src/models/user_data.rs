// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user persisted aggregate and its sub-collections.
//!
//! `UserData` is the single source of truth for one user's state. Every
//! field serializes camelCase so the on-disk document doubles as the
//! backup-file format: `{userId, matches, seenEvents, createdAt, ...}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::event::EventRecord;
use crate::models::preferences::{AiPreferences, Preferences};
use crate::models::user::UserIdentity;

/// Snapshot version written into exports.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// A persisted like/super-like decision.
///
/// The embedded event is a value snapshot frozen at decision time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub matched_at: String,
    pub event: EventRecord,
}

/// Per-calendar-day activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    #[serde(default)]
    pub seen: u32,
    #[serde(default)]
    pub matches: u32,
    #[serde(default)]
    pub sessions: u32,
}

/// The per-user aggregate document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub user_id: String,
    pub created_at: String,
    pub last_accessed: String,
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub seen_events: Vec<String>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
    #[serde(default)]
    pub ai_preferences: Option<AiPreferences>,
    /// Day key ("YYYY-MM-DD") to counters; BTreeMap keeps keys sorted so
    /// retention trimming can drop the oldest days directly.
    #[serde(default)]
    pub analytics: BTreeMap<String, DayStats>,
    #[serde(default)]
    pub profile: Option<UserIdentity>,
    /// Stamped when the aggregate was restored from a backup file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<String>,
}

impl UserData {
    /// Fresh empty aggregate for a first-seen user.
    pub fn new(user_id: &str, now: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            created_at: now.to_string(),
            last_accessed: now.to_string(),
            matches: Vec::new(),
            seen_events: Vec::new(),
            preferences: None,
            ai_preferences: None,
            analytics: BTreeMap::new(),
            profile: None,
            imported_at: None,
        }
    }
}

/// Exported backup document: the aggregate plus export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(flatten)]
    pub data: UserData,
    pub exported_at: String,
    pub version: String,
}

/// Status of an asynchronous service authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    Pending,
    Approved,
    Denied,
}

/// A pending external-service authorization, keyed by request id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAuthorization {
    pub purpose: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub status: AuthorizationStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Summary of the current user's stored footprint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub user_id: String,
    pub user_type: String,
    pub matches: usize,
    pub seen_events: usize,
    pub account_age_days: i64,
    pub last_accessed: String,
    pub storage_size_kb: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_serializes_camel_case() {
        let data = UserData::new("guest_abc", "2025-06-01T00:00:00Z");
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"userId\""));
        assert!(json.contains("\"seenEvents\""));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"lastAccessed\""));
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let data: UserData = serde_json::from_str(
            r#"{
                "userId": "email_a@b.c",
                "createdAt": "2025-01-01T00:00:00Z",
                "lastAccessed": "2025-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(data.matches.is_empty());
        assert!(data.seen_events.is_empty());
        assert!(data.analytics.is_empty());
    }
}
