// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user namespaced persistence over the key-value store.
//!
//! Owns the `UserData` aggregate plus the legacy (non-namespaced) mirrors
//! kept for backward compatibility. The namespaced copy always wins; legacy
//! values are read only when the namespaced copy is empty.
//!
//! Every operation degrades on storage faults: reads fall back to empty
//! values and writes report `false`, but nothing here raises.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::user_data::{
    AuthorizationStatus, PendingAuthorization, Snapshot, StorageStats, SNAPSHOT_VERSION,
};
use crate::models::{
    AiPreferences, DayStats, EventRecord, Match, Preferences, UserData, UserIdentity,
};
use crate::store::kv::KvStore;
use crate::store::{caps, keys};
use crate::time_utils::{day_key, format_utc_rfc3339};

/// Clock source, injectable for tests.
pub type Clock = fn() -> DateTime<Utc>;

/// Unique-suffix source for generated ids, injectable for tests.
pub type IdSource = fn() -> String;

fn default_id_source() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Which per-day counter a mutation bumps.
#[derive(Clone, Copy)]
enum Stat {
    Seen,
    Match,
    Session,
}

/// Per-user persistence facade.
pub struct UserStore {
    kv: KvStore,
    clock: Clock,
    ids: IdSource,
}

impl UserStore {
    pub fn new(kv: KvStore) -> Self {
        Self::with_sources(kv, Utc::now, default_id_source)
    }

    /// Construct with explicit clock and id sources (test doubles).
    pub fn with_sources(kv: KvStore, clock: Clock, ids: IdSource) -> Self {
        Self { kv, clock, ids }
    }

    pub fn kv(&self) -> &KvStore {
        &self.kv
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn now_str(&self) -> String {
        format_utc_rfc3339(self.now())
    }

    fn scoped(base: &str, user_id: &str) -> String {
        format!("{}_{}", base, user_id)
    }

    // ─── Identity ────────────────────────────────────────────────

    /// Resolve the partition key for all per-user state.
    ///
    /// Priority: email claim, then subject claim, then legacy numeric id
    /// (all from the stored identity record), then the persisted guest id.
    /// A brand-new guest gets a random id that is persisted immediately so
    /// it stays stable across restarts.
    pub fn resolve_user_id(&self) -> String {
        if let Some(user) = self.kv.get_json::<UserIdentity>(keys::USER) {
            if let Some(id) = user.derived_id() {
                return id;
            }
        }

        if let Some(guest_id) = self.kv.get_json::<String>(keys::GUEST_ID) {
            return guest_id;
        }

        let guest_id = format!("guest_{}", (self.ids)());
        self.kv.set_json(keys::GUEST_ID, &guest_id);
        tracing::debug!(guest_id = %guest_id, "Minted new guest id");
        guest_id
    }

    /// Store the identity record and mirror it into the aggregate profile.
    pub fn save_user(&self, user: &UserIdentity) -> bool {
        if !self.kv.set_json(keys::USER, user) {
            return false;
        }
        let mut data = self.user_data();
        data.profile = Some(user.clone());
        self.save_user_data(&mut data)
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.kv.get_json(keys::USER)
    }

    /// Drop the identity record. The user's aggregate is kept so history
    /// survives a sign-out; `clear_all` is the full wipe.
    pub fn remove_user(&self) -> bool {
        self.kv.remove(keys::USER)
    }

    // ─── Aggregate ───────────────────────────────────────────────

    /// Read the aggregate for the current user, creating and persisting a
    /// fresh empty one on first access. Never absent.
    pub fn user_data(&self) -> UserData {
        let user_id = self.resolve_user_id();
        let key = Self::scoped(keys::USER_DATA, &user_id);

        if let Some(data) = self.kv.get_json::<UserData>(&key) {
            return data;
        }

        let data = UserData::new(&user_id, &self.now_str());
        self.kv.set_json(&key, &data);
        data
    }

    /// Full-aggregate overwrite; always stamps `lastAccessed`.
    pub fn save_user_data(&self, data: &mut UserData) -> bool {
        data.last_accessed = self.now_str();
        let key = Self::scoped(keys::USER_DATA, &data.user_id);
        self.kv.set_json(&key, data)
    }

    // ─── Matches ─────────────────────────────────────────────────

    /// Record a like/super-like decision.
    ///
    /// Prepends a match snapshot, truncates to the cap, mirrors into the
    /// legacy collection, and bumps the day's `matches` counter. Calling
    /// twice for the same event creates two entries; de-duplication is
    /// intentionally not performed here.
    pub fn add_match(&self, event: &EventRecord) -> bool {
        let mut data = self.user_data();

        let entry = Match {
            id: format!("match_{}", (self.ids)()),
            matched_at: self.now_str(),
            event: event.clone(),
        };

        data.matches.insert(0, entry.clone());
        data.matches.truncate(caps::MATCHES);
        self.bump_stat(&mut data, Stat::Match);

        let saved = self.save_user_data(&mut data);

        // Legacy mirror, tolerating old bare-event entries.
        let mut legacy: Vec<Value> = self.kv.get_json(keys::MATCHES).unwrap_or_default();
        if let Ok(value) = serde_json::to_value(&entry) {
            legacy.insert(0, value);
        }
        legacy.truncate(caps::LEGACY_MATCHES);
        self.kv.set_json(keys::MATCHES, &legacy);

        self.bump_legacy_stat(Stat::Match);

        tracing::debug!(user_id = %data.user_id, event = %event.name, "Match saved");
        saved
    }

    /// Remove every match for the given event id from both copies.
    pub fn remove_match(&self, event_id: &str) -> bool {
        let mut data = self.user_data();
        data.matches.retain(|m| m.event.id != event_id);
        let saved = self.save_user_data(&mut data);

        let legacy: Vec<Value> = self.kv.get_json(keys::MATCHES).unwrap_or_default();
        let filtered: Vec<Value> = legacy
            .into_iter()
            .filter(|v| {
                let id = v
                    .get("event")
                    .and_then(|e| e.get("id"))
                    .or_else(|| v.get("id"))
                    .and_then(Value::as_str);
                id != Some(event_id)
            })
            .collect();
        self.kv.set_json(keys::MATCHES, &filtered);

        saved
    }

    /// Stored matches, newest first. Falls back to the legacy collection
    /// only when the namespaced list is empty.
    pub fn matches(&self) -> Vec<Match> {
        let data = self.user_data();
        if !data.matches.is_empty() {
            return data.matches;
        }

        let legacy: Vec<Value> = self.kv.get_json(keys::MATCHES).unwrap_or_default();
        legacy
            .into_iter()
            .filter_map(|v| self.normalize_legacy_match(v))
            .collect()
    }

    /// Legacy entries are either full match records or bare event objects.
    fn normalize_legacy_match(&self, value: Value) -> Option<Match> {
        if value.get("event").is_some() {
            let matched_at = value
                .get("matchedAt")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| self.now_str());
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("legacy_{}", (self.ids)()));
            let event: EventRecord = serde_json::from_value(value.get("event")?.clone()).ok()?;
            return Some(Match {
                id,
                matched_at,
                event,
            });
        }

        let event: EventRecord = serde_json::from_value(value).ok()?;
        Some(Match {
            id: format!("legacy_{}", (self.ids)()),
            matched_at: self.now_str(),
            event,
        })
    }

    // ─── Seen events ─────────────────────────────────────────────

    /// Mark an event as decided. No-op when the id is already present;
    /// otherwise appends, evicts the oldest id past the cap (FIFO), and
    /// bumps the day's `seen` counter.
    pub fn add_seen_event(&self, event_id: &str) -> bool {
        let mut data = self.user_data();
        if data.seen_events.iter().any(|id| id == event_id) {
            return true;
        }

        data.seen_events.push(event_id.to_string());
        while data.seen_events.len() > caps::SEEN_EVENTS {
            data.seen_events.remove(0);
        }
        self.bump_stat(&mut data, Stat::Seen);
        let saved = self.save_user_data(&mut data);

        let mut legacy: Vec<String> = self.kv.get_json(keys::SEEN_EVENTS).unwrap_or_default();
        if !legacy.iter().any(|id| id == event_id) {
            legacy.push(event_id.to_string());
            while legacy.len() > caps::LEGACY_SEEN_EVENTS {
                legacy.remove(0);
            }
            self.kv.set_json(keys::SEEN_EVENTS, &legacy);
        }

        self.bump_legacy_stat(Stat::Seen);
        saved
    }

    pub fn seen_events(&self) -> Vec<String> {
        let data = self.user_data();
        if !data.seen_events.is_empty() {
            return data.seen_events;
        }
        self.kv.get_json(keys::SEEN_EVENTS).unwrap_or_default()
    }

    // ─── Preferences ─────────────────────────────────────────────

    pub fn save_preferences(&self, preferences: &Preferences) -> bool {
        self.kv.set_json(keys::PREFERENCES, preferences);

        let mut stamped = preferences.clone();
        stamped.updated_at = Some(self.now_str());
        let mut data = self.user_data();
        data.preferences = Some(stamped);
        self.save_user_data(&mut data)
    }

    pub fn preferences(&self) -> Option<Preferences> {
        let data = self.user_data();
        if data.preferences.is_some() {
            return data.preferences;
        }
        self.kv.get_json(keys::PREFERENCES)
    }

    pub fn save_ai_preferences(&self, ai_preferences: &AiPreferences) -> bool {
        self.kv.set_json(keys::AI_PREFERENCES, ai_preferences);

        let mut stamped = ai_preferences.clone();
        stamped.updated_at = Some(self.now_str());
        let mut data = self.user_data();
        data.ai_preferences = Some(stamped);
        self.save_user_data(&mut data)
    }

    pub fn ai_preferences(&self) -> Option<AiPreferences> {
        let data = self.user_data();
        if data.ai_preferences.is_some() {
            return data.ai_preferences;
        }
        self.kv.get_json(keys::AI_PREFERENCES)
    }

    // ─── Analytics ───────────────────────────────────────────────

    /// Bump the day's `sessions` counter.
    pub fn record_session(&self) -> bool {
        let mut data = self.user_data();
        self.bump_stat(&mut data, Stat::Session);
        let saved = self.save_user_data(&mut data);
        self.bump_legacy_stat(Stat::Session);
        saved
    }

    pub fn analytics(&self) -> std::collections::BTreeMap<String, DayStats> {
        let data = self.user_data();
        if !data.analytics.is_empty() {
            return data.analytics;
        }
        self.kv.get_json(keys::ANALYTICS).unwrap_or_default()
    }

    fn bump_stat(&self, data: &mut UserData, stat: Stat) {
        let key = day_key(self.now());
        let entry = data.analytics.entry(key).or_default();
        match stat {
            Stat::Seen => entry.seen += 1,
            Stat::Match => entry.matches += 1,
            Stat::Session => entry.sessions += 1,
        }
        while data.analytics.len() > caps::ANALYTICS_DAYS {
            data.analytics.pop_first();
        }
    }

    fn bump_legacy_stat(&self, stat: Stat) {
        let mut analytics: std::collections::BTreeMap<String, DayStats> =
            self.kv.get_json(keys::ANALYTICS).unwrap_or_default();
        let key = day_key(self.now());
        let entry = analytics.entry(key).or_default();
        match stat {
            Stat::Seen => entry.seen += 1,
            Stat::Match => entry.matches += 1,
            Stat::Session => entry.sessions += 1,
        }
        while analytics.len() > caps::LEGACY_ANALYTICS_DAYS {
            analytics.pop_first();
        }
        self.kv.set_json(keys::ANALYTICS, &analytics);
    }

    // ─── Backup / restore ────────────────────────────────────────

    /// Snapshot the aggregate for download. Pure read: a first-time user
    /// gets an empty snapshot without anything being persisted.
    pub fn export_snapshot(&self) -> Snapshot {
        let user_id = self.resolve_user_id();
        let key = Self::scoped(keys::USER_DATA, &user_id);
        let data = self
            .kv
            .get_json::<UserData>(&key)
            .unwrap_or_else(|| UserData::new(&user_id, &self.now_str()));

        Snapshot {
            data,
            exported_at: self.now_str(),
            version: SNAPSHOT_VERSION.to_string(),
        }
    }

    /// Restore the aggregate from a backup document.
    ///
    /// All-or-nothing: the document must carry `userId` (string), `matches`
    /// (array), `seenEvents` (array), and `createdAt` (string) and must
    /// parse as a whole, otherwise nothing is touched and `false` comes
    /// back. On success the aggregate is replaced under the current user id
    /// and the legacy mirrors are refreshed.
    pub fn import_snapshot(&self, document: &Value) -> bool {
        if !document.get("userId").is_some_and(Value::is_string)
            || !document.get("matches").is_some_and(Value::is_array)
            || !document.get("seenEvents").is_some_and(Value::is_array)
            || !document.get("createdAt").is_some_and(Value::is_string)
        {
            tracing::warn!("Rejected import: missing or malformed required fields");
            return false;
        }

        let mut data: UserData = match serde_json::from_value(document.clone()) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected import: document failed to parse");
                return false;
            }
        };

        // The backup is restored into the current user's namespace.
        data.user_id = self.resolve_user_id();
        data.imported_at = Some(self.now_str());

        if !self.save_user_data(&mut data) {
            return false;
        }

        self.kv.set_json(keys::MATCHES, &data.matches);
        self.kv.set_json(keys::SEEN_EVENTS, &data.seen_events);
        if let Some(prefs) = &data.preferences {
            self.kv.set_json(keys::PREFERENCES, prefs);
        }
        if let Some(ai) = &data.ai_preferences {
            self.kv.set_json(keys::AI_PREFERENCES, ai);
        }

        tracing::info!(
            matches = data.matches.len(),
            seen = data.seen_events.len(),
            "User data imported"
        );
        true
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Remove every namespaced and legacy key for the current user,
    /// including the persisted guest id: the next `resolve_user_id` mints
    /// a brand-new guest identity.
    pub fn clear_all(&self) -> bool {
        let user_id = self.resolve_user_id();
        for base in keys::ALL {
            self.kv.remove(base);
            self.kv.remove(&Self::scoped(base, &user_id));
        }
        self.kv.remove(keys::GUEST_ID);
        true
    }

    /// One-time copy of legacy (non-namespaced) collections into the
    /// aggregate, only for fields that are still empty there. Never
    /// overwrites namespaced data; idempotent after the first run.
    pub fn migrate_legacy_data(&self) -> bool {
        let mut data = self.user_data();
        let mut migrated = false;

        if data.matches.is_empty() {
            let legacy: Vec<Value> = self.kv.get_json(keys::MATCHES).unwrap_or_default();
            if !legacy.is_empty() {
                data.matches = legacy
                    .into_iter()
                    .filter_map(|v| self.normalize_legacy_match(v))
                    .map(|mut m| {
                        m.id = format!("migrated_{}", (self.ids)());
                        m
                    })
                    .collect();
                migrated = true;
            }
        }

        if data.seen_events.is_empty() {
            let legacy: Vec<String> = self.kv.get_json(keys::SEEN_EVENTS).unwrap_or_default();
            if !legacy.is_empty() {
                data.seen_events = legacy;
                migrated = true;
            }
        }

        if data.preferences.is_none() {
            if let Some(prefs) = self.kv.get_json::<Preferences>(keys::PREFERENCES) {
                data.preferences = Some(prefs);
                migrated = true;
            }
        }

        if data.ai_preferences.is_none() {
            if let Some(ai) = self.kv.get_json::<AiPreferences>(keys::AI_PREFERENCES) {
                data.ai_preferences = Some(ai);
                migrated = true;
            }
        }

        if migrated {
            self.save_user_data(&mut data);
            tracing::info!(user_id = %data.user_id, "Legacy data migrated");
        }
        migrated
    }

    /// Footprint summary for diagnostics.
    pub fn storage_stats(&self) -> StorageStats {
        let data = self.user_data();
        let user_id = data.user_id.clone();

        let account_age_days = DateTime::parse_from_rfc3339(&data.created_at)
            .map(|created| (self.now() - created.with_timezone(&Utc)).num_days())
            .unwrap_or(0);

        let total_bytes: usize = self
            .kv
            .keys()
            .iter()
            .filter(|k| k.starts_with(keys::PREFIX))
            .filter_map(|k| self.kv.get_raw(k))
            .map(|v| v.len())
            .sum();

        StorageStats {
            user_type: if user_id.starts_with("guest") {
                "guest".to_string()
            } else {
                "authenticated".to_string()
            },
            user_id,
            matches: data.matches.len(),
            seen_events: data.seen_events.len(),
            account_age_days,
            last_accessed: data.last_accessed,
            storage_size_kb: (total_bytes as f64 / 1024.0 * 100.0).round() / 100.0,
        }
    }

    // ─── Pending authorizations ──────────────────────────────────

    pub fn save_pending_auth(&self, request_id: &str, purpose: &str, scopes: &[String]) -> bool {
        let mut all = self.all_pending_auths();
        all.insert(
            request_id.to_string(),
            PendingAuthorization {
                purpose: purpose.to_string(),
                scopes: scopes.to_vec(),
                status: AuthorizationStatus::Pending,
                created_at: self.now_str(),
                updated_at: None,
            },
        );
        self.kv.set_json(keys::PENDING_AUTH, &all)
    }

    pub fn pending_auth(&self, request_id: &str) -> Option<PendingAuthorization> {
        self.all_pending_auths().remove(request_id)
    }

    pub fn all_pending_auths(&self) -> HashMap<String, PendingAuthorization> {
        self.kv.get_json(keys::PENDING_AUTH).unwrap_or_default()
    }

    /// Update the status of a pending request. `false` if unknown.
    pub fn update_pending_auth(&self, request_id: &str, status: AuthorizationStatus) -> bool {
        let mut all = self.all_pending_auths();
        match all.get_mut(request_id) {
            Some(auth) => {
                auth.status = status;
                auth.updated_at = Some(self.now_str());
                self.kv.set_json(keys::PENDING_AUTH, &all)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationType;

    fn fixed_clock() -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn test_store() -> UserStore {
        UserStore::with_sources(KvStore::in_memory(), fixed_clock, default_id_source)
    }

    fn make_event(id: &str) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            name: format!("Event {}", id),
            start_at: "2025-06-15T09:00:00Z".to_string(),
            end_at: "2025-06-15T18:00:00Z".to_string(),
            location_type: LocationType::Offline,
            city_state: Some("San Francisco, California".to_string()),
            cover_url: None,
            organizer_name: "Host".to_string(),
            organizer_avatar_url: None,
            organizer_description: None,
            url: None,
        }
    }

    #[test]
    fn test_guest_id_is_stable_across_calls() {
        let store = test_store();
        let first = store.resolve_user_id();
        let second = store.resolve_user_id();
        assert!(first.starts_with("guest_"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_user_data_first_access_creates() {
        let store = test_store();
        let data = store.user_data();
        assert!(data.matches.is_empty());
        // Second read returns the persisted aggregate, not a new one.
        let again = store.user_data();
        assert_eq!(data.created_at, again.created_at);
        assert_eq!(data.user_id, again.user_id);
    }

    #[test]
    fn test_add_seen_event_is_idempotent() {
        let store = test_store();
        store.add_seen_event("evt-1");
        store.add_seen_event("evt-1");
        let seen = store.seen_events();
        assert_eq!(seen, vec!["evt-1".to_string()]);

        let stats = store.analytics();
        assert_eq!(stats.values().next().unwrap().seen, 1);
    }

    #[test]
    fn test_add_match_bumps_counter_and_mirrors_legacy() {
        let store = test_store();
        store.add_match(&make_event("evt-1"));

        assert_eq!(store.matches().len(), 1);
        let legacy: Vec<Value> = store.kv().get_json(keys::MATCHES).unwrap();
        assert_eq!(legacy.len(), 1);

        let stats = store.analytics();
        assert_eq!(stats.get("2025-06-01").unwrap().matches, 1);
    }

    #[test]
    fn test_analytics_retention_trims_oldest() {
        let store = test_store();
        let mut data = store.user_data();
        for day in 0..(caps::ANALYTICS_DAYS + 5) {
            data.analytics.insert(
                format!("2025-01-{:02}x{}", day % 28 + 1, day),
                DayStats::default(),
            );
        }
        store.bump_stat(&mut data, Stat::Seen);
        assert!(data.analytics.len() <= caps::ANALYTICS_DAYS);
    }

    #[test]
    fn test_pending_auth_lifecycle() {
        let store = test_store();
        assert!(store.save_pending_auth("req-1", "calendar access", &[]));
        assert_eq!(
            store.pending_auth("req-1").unwrap().status,
            AuthorizationStatus::Pending
        );
        assert!(store.update_pending_auth("req-1", AuthorizationStatus::Approved));
        assert_eq!(
            store.pending_auth("req-1").unwrap().status,
            AuthorizationStatus::Approved
        );
        assert!(!store.update_pending_auth("missing", AuthorizationStatus::Denied));
    }
}
