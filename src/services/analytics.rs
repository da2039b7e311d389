// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Analytics delivery to the external webhook.
//!
//! Events are queued in memory and shipped in batches: when the queue
//! reaches the batch size, on the periodic flush timer, or immediately for
//! session end. Delivery is fire-and-forget from the caller's point of
//! view; a batch that still fails after the retry cap is dropped. Nothing
//! survives a restart.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::models::{AiPreferences, EventRecord, Preferences, UserIdentity};
use crate::session::Decision;
use crate::time_utils::format_utc_rfc3339;

/// Queue length that triggers an immediate flush.
pub const BATCH_SIZE: usize = 10;
/// Periodic flush interval.
pub const FLUSH_INTERVAL_SECS: u64 = 30;
/// Delivery attempts per batch before it is dropped.
const MAX_RETRIES: u32 = 3;
/// Base backoff delay, doubled per attempt.
const RETRY_BASE_DELAY_MS: u64 = 1000;

/// One queued analytics event envelope.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
    pub data: Value,
    pub user: Value,
    pub session: Value,
    pub app: Value,
}

struct SinkInner {
    endpoint: Option<String>,
    http: reqwest::Client,
    queue: Mutex<Vec<AnalyticsEvent>>,
    user_context: Mutex<Value>,
    session_started_at: String,
}

/// Batched, retrying analytics publisher.
///
/// Cloneable handle; all clones share one queue. With no endpoint
/// configured the sink is disabled and `publish` drops silently.
#[derive(Clone)]
pub struct AnalyticsSink {
    inner: Arc<SinkInner>,
}

impl AnalyticsSink {
    pub fn new(endpoint: Option<String>) -> Self {
        if endpoint.is_none() {
            tracing::debug!("Analytics sink disabled (no endpoint configured)");
        }
        Self {
            inner: Arc::new(SinkInner {
                endpoint,
                http: reqwest::Client::new(),
                queue: Mutex::new(Vec::new()),
                user_context: Mutex::new(Value::Null),
                session_started_at: format_utc_rfc3339(Utc::now()),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.endpoint.is_some()
    }

    /// Attach the user context stamped onto every envelope.
    pub fn set_user_context(&self, user_id: &str, user: Option<&UserIdentity>) {
        let context = json!({
            "id": user_id,
            "type": if user_id.starts_with("guest") { "guest" } else { "authenticated" },
            "profile": user.map(|u| json!({
                "name": u.display_name,
                "email": u.email,
                "provider": u.provider,
            })),
        });
        *lock(&self.inner.user_context) = context;
    }

    /// Queue an event. Never blocks, never fails the caller; a full batch
    /// kicks off a background flush when a runtime is available.
    pub fn publish(&self, kind: &str, data: Value) {
        if !self.is_enabled() {
            return;
        }

        let event = AnalyticsEvent {
            id: format!("evt_{}", uuid::Uuid::new_v4().simple()),
            kind: kind.to_string(),
            timestamp: format_utc_rfc3339(Utc::now()),
            data,
            user: lock(&self.inner.user_context).clone(),
            session: json!({
                "startedAt": self.inner.session_started_at,
                "lastActivity": format_utc_rfc3339(Utc::now()),
            }),
            app: json!({ "version": "1.0", "name": "Event Matcher" }),
        };

        tracing::debug!(kind, "Queueing analytics event");
        let should_flush = {
            let mut queue = lock(&self.inner.queue);
            queue.push(event);
            queue.len() >= BATCH_SIZE
        };

        if should_flush {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let sink = self.clone();
                handle.spawn(async move {
                    sink.flush().await;
                });
            }
        }
    }

    /// Number of queued, undelivered events.
    pub fn pending(&self) -> usize {
        lock(&self.inner.queue).len()
    }

    /// Drain the queue and deliver it as one batch. Returns whether the
    /// batch was accepted; a batch that exhausts its retries is dropped.
    pub async fn flush(&self) -> bool {
        let endpoint = match &self.inner.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => return false,
        };

        let events = std::mem::take(&mut *lock(&self.inner.queue));
        if events.is_empty() {
            return false;
        }
        let count = events.len();

        let payload = json!({
            "batch": true,
            "events": events,
            "metadata": {
                "batchSize": count,
                "sentAt": format_utc_rfc3339(Utc::now()),
                "source": "event-matcher-app",
            },
        });

        tracing::debug!(count, "Sending analytics batch");
        if self.deliver(&endpoint, &payload).await {
            tracing::debug!(count, "Analytics batch delivered");
            true
        } else {
            tracing::warn!(count, "Dropping analytics batch after retries");
            false
        }
    }

    /// POST with bounded exponential backoff. Retries on network errors
    /// and 5xx; a 4xx is a hard failure.
    async fn deliver(&self, endpoint: &str, payload: &Value) -> bool {
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = RETRY_BASE_DELAY_MS * 2u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.inner.http.post(endpoint).json(payload).send().await {
                Ok(response) if response.status().is_success() => return true,
                Ok(response) if response.status().is_server_error() => {
                    tracing::warn!(status = %response.status(), attempt, "Webhook server error");
                }
                Ok(response) => {
                    tracing::warn!(status = %response.status(), "Webhook rejected batch");
                    return false;
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Webhook request failed");
                }
            }
        }
        false
    }

    /// Periodic flush loop; runs until the handle is dropped/aborted.
    pub fn spawn_periodic_flush(&self) -> tokio::task::JoinHandle<()> {
        let sink = self.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(FLUSH_INTERVAL_SECS));
            interval.tick().await; // First tick fires immediately; skip it.
            loop {
                interval.tick().await;
                if sink.pending() > 0 {
                    sink.flush().await;
                }
            }
        })
    }

    // ─── Typed trackers ──────────────────────────────────────────

    pub fn track_session_start(&self) {
        self.publish(
            "session_start",
            json!({ "timestamp": format_utc_rfc3339(Utc::now()) }),
        );
    }

    /// Session end is the one event that flushes immediately.
    pub async fn track_session_end(&self) {
        self.publish("session_end", json!({ "eventsInQueue": self.pending() }));
        self.flush().await;
    }

    pub fn track_authentication(&self, user: &UserIdentity) {
        self.publish(
            "user_authenticated",
            json!({
                "provider": user.provider,
                "userType": if user.is_guest() { "guest" } else { "authenticated" },
                "hasProfile": !user.display_name.is_empty() || user.email.is_some(),
            }),
        );
    }

    pub fn track_match(&self, event: &EventRecord, decision: Decision) {
        self.publish(
            "match_created",
            json!({
                "eventId": event.id,
                "eventName": event.name,
                "eventType": event.location_type,
                "eventDate": event.start_at,
                "location": event.city_state,
                "url": event.external_url(),
                "action": decision.as_str(),
            }),
        );
    }

    pub fn track_event_seen(&self, event: &EventRecord, decision: Decision) {
        self.publish(
            "event_seen",
            json!({
                "eventId": event.id,
                "eventName": event.name,
                "action": decision.as_str(),
                "eventType": event.location_type,
            }),
        );
    }

    pub fn track_preferences_update(&self, preferences: &Preferences) {
        self.publish(
            "preferences_updated",
            json!({
                "interests": preferences.interests,
                "format": preferences.format,
                "location": preferences.location,
                "hasName": preferences.display_name.is_some(),
                "hasOccupation": preferences.occupation.is_some(),
            }),
        );
    }

    pub fn track_ai_preferences_update(&self, ai_preferences: &AiPreferences) {
        self.publish(
            "ai_preferences_updated",
            json!({
                "allowRecommendations": ai_preferences.allow_recommendations,
                "privacyLevel": ai_preferences.privacy_level,
                "connectedServices": connected_services(ai_preferences),
            }),
        );
    }

    pub fn track_data_export(&self) {
        self.publish("data_exported", json!({ "action": "user_data_export" }));
    }

    pub fn track_data_import(&self, matches: usize, has_preferences: bool) {
        self.publish(
            "data_imported",
            json!({
                "action": "user_data_import",
                "matchesCount": matches,
                "hasPreferences": has_preferences,
            }),
        );
    }
}

fn connected_services(ai_preferences: &AiPreferences) -> Vec<&'static str> {
    let mut services = Vec::new();
    if ai_preferences.connect_calendar {
        services.push("calendar");
    }
    if ai_preferences.connect_slack {
        services.push("slack");
    }
    if ai_preferences.connect_github {
        services.push("github");
    }
    services
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
