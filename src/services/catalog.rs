// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event catalog loading.
//!
//! Sources are tried in a fixed order with a uniform contract; any
//! source's failure falls through to the next one:
//! 1. Apify dataset API (bearer token, bounded retry with backoff)
//! 2. Cached last-known-good snapshot (24h freshness window)
//! 3. Bundled local dataset file
//! 4. Built-in sample set
//!
//! Only total exhaustion is an error, and the sample set never fails, so
//! a load practically always produces a catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::{Config, CACHE_MAX_AGE_HOURS};
use crate::error::AppError;
use crate::models::{EventRecord, LocationType};
use crate::store::{keys, KvStore};
use crate::time_utils::format_utc_rfc3339;

/// Attempts against the remote API before falling through.
const MAX_FETCH_ATTEMPTS: u32 = 3;
/// Base backoff delay, doubled per attempt.
const RETRY_BASE_DELAY_MS: u64 = 1000;

/// One stage of the catalog fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    RemoteApi,
    CachedSnapshot,
    LocalDataset,
    SampleData,
}

impl CatalogSource {
    /// Fallback order.
    pub const CHAIN: [CatalogSource; 4] = [
        CatalogSource::RemoteApi,
        CatalogSource::CachedSnapshot,
        CatalogSource::LocalDataset,
        CatalogSource::SampleData,
    ];

    /// Human-readable source label, shown next to the event count.
    pub fn label(&self) -> &'static str {
        match self {
            CatalogSource::RemoteApi => "Apify API",
            CatalogSource::CachedSnapshot => "Cached",
            CatalogSource::LocalDataset => "Local File",
            CatalogSource::SampleData => "Sample Data",
        }
    }
}

/// A loaded catalog plus the source that produced it.
#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub events: Vec<EventRecord>,
    pub source: CatalogSource,
}

/// Cached snapshot document stored in the key-value store.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedCatalog {
    events: Vec<EventRecord>,
    cached_at: String,
    source: String,
}

/// Catalog loader over the fallback chain.
#[derive(Clone)]
pub struct CatalogService {
    http: reqwest::Client,
    config: Config,
    kv: KvStore,
}

impl CatalogService {
    pub fn new(config: Config, kv: KvStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            kv,
        }
    }

    /// Load the catalog, walking the source chain. A remote success
    /// refreshes the cached snapshot for offline use.
    pub async fn load(&self) -> CatalogLoad {
        for source in CatalogSource::CHAIN {
            match self.try_source(source).await {
                Ok(events) => {
                    tracing::info!(
                        count = events.len(),
                        source = source.label(),
                        "Catalog loaded"
                    );
                    if source == CatalogSource::RemoteApi {
                        self.cache_events(&events);
                    }
                    return CatalogLoad { events, source };
                }
                Err(e) => {
                    tracing::warn!(source = source.label(), error = %e, "Catalog source failed, falling through");
                }
            }
        }

        // The sample source cannot fail, but keep a defined terminal state.
        CatalogLoad {
            events: Vec::new(),
            source: CatalogSource::SampleData,
        }
    }

    /// Uniform per-source contract.
    pub async fn try_source(&self, source: CatalogSource) -> Result<Vec<EventRecord>, AppError> {
        match source {
            CatalogSource::RemoteApi => self.fetch_remote().await,
            CatalogSource::CachedSnapshot => self.load_cached(),
            CatalogSource::LocalDataset => self.load_local(),
            CatalogSource::SampleData => Ok(sample_events()),
        }
    }

    // ─── Remote API ──────────────────────────────────────────────

    /// Dataset items endpoint: a specific run id takes priority over the
    /// actor's latest successful run.
    fn remote_url(&self) -> Result<String, AppError> {
        if let Some(run_id) = &self.config.apify_run_id {
            return Ok(format!(
                "{}/actor-runs/{}/dataset/items",
                self.config.apify_base_url, run_id
            ));
        }
        if let Some(actor_id) = &self.config.apify_actor_id {
            return Ok(format!(
                "{}/acts/{}/runs/last/dataset/items?status=SUCCEEDED",
                self.config.apify_base_url, actor_id
            ));
        }
        Err(AppError::CatalogApi(
            "No Apify run or actor configured".to_string(),
        ))
    }

    async fn fetch_remote(&self) -> Result<Vec<EventRecord>, AppError> {
        let token = self
            .config
            .apify_api_token
            .as_deref()
            .ok_or_else(|| AppError::CatalogApi("No Apify API token configured".to_string()))?;
        let url = self.remote_url()?;

        let mut last_error = AppError::CatalogApi("unreachable".to_string());
        for attempt in 0..MAX_FETCH_ATTEMPTS {
            if attempt > 0 {
                let delay = RETRY_BASE_DELAY_MS * 2u64.pow(attempt - 1);
                tracing::debug!(attempt, delay_ms = delay, "Retrying catalog fetch");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.fetch_once(&url, token).await {
                Ok(events) => return Ok(events),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt, error = %e, "Catalog fetch attempt failed");
                    last_error = e;
                }
                // A malformed body won't improve on retry.
                Err(e) => return Err(e),
            }
        }
        Err(last_error)
    }

    async fn fetch_once(&self, url: &str, token: &str) -> Result<Vec<EventRecord>, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::CatalogApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CatalogApi(format!("HTTP {}: {}", status, body)));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::CatalogApi(format!("JSON parse error: {}", e)))?;

        let items = data.as_array().ok_or_else(|| {
            AppError::Validation("Invalid data format: expected array of events".to_string())
        })?;

        Ok(convert_items(items))
    }

    // ─── Cached snapshot ─────────────────────────────────────────

    fn load_cached(&self) -> Result<Vec<EventRecord>, AppError> {
        let cached: CachedCatalog = self
            .kv
            .get_json(keys::CACHED_EVENTS)
            .ok_or_else(|| AppError::CatalogApi("No cached catalog".to_string()))?;

        let cached_at = DateTime::parse_from_rfc3339(&cached.cached_at)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Bad cache timestamp: {}", e)))?
            .with_timezone(&Utc);

        let age = Utc::now() - cached_at;
        if age > chrono::Duration::hours(CACHE_MAX_AGE_HOURS) {
            return Err(AppError::CatalogApi(format!(
                "Cached catalog is stale ({}h old)",
                age.num_hours()
            )));
        }

        tracing::debug!(
            count = cached.events.len(),
            age_minutes = age.num_minutes(),
            "Using cached catalog"
        );
        Ok(cached.events)
    }

    fn cache_events(&self, events: &[EventRecord]) {
        let cached = CachedCatalog {
            events: events.to_vec(),
            cached_at: format_utc_rfc3339(Utc::now()),
            source: CatalogSource::RemoteApi.label().to_string(),
        };
        if !self.kv.set_json(keys::CACHED_EVENTS, &cached) {
            tracing::warn!("Failed to cache catalog snapshot");
        }
    }

    // ─── Local dataset ───────────────────────────────────────────

    fn load_local(&self) -> Result<Vec<EventRecord>, AppError> {
        let raw = std::fs::read_to_string(&self.config.local_dataset_path)
            .map_err(|e| AppError::CatalogApi(format!("Failed to read dataset file: {}", e)))?;
        let items: Vec<Value> = serde_json::from_str(&raw)
            .map_err(|e| AppError::CatalogApi(format!("Failed to parse dataset file: {}", e)))?;
        Ok(convert_items(&items))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire models - the lu.ma scraper dataset item shape
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DatasetItem {
    api_id: String,
    event: DatasetEvent,
    calendar: DatasetCalendar,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatasetEvent {
    name: String,
    #[serde(default)]
    cover_url: Option<String>,
    start_at: String,
    end_at: String,
    location_type: LocationType,
    #[serde(default)]
    geo_address_info: Option<GeoAddressInfo>,
}

#[derive(Debug, Deserialize)]
struct GeoAddressInfo {
    #[serde(default)]
    city_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatasetCalendar {
    name: String,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    description_short: Option<String>,
}

impl From<DatasetItem> for EventRecord {
    fn from(item: DatasetItem) -> Self {
        EventRecord {
            id: item.api_id,
            name: item.event.name,
            start_at: item.event.start_at,
            end_at: item.event.end_at,
            location_type: item.event.location_type,
            city_state: item.event.geo_address_info.and_then(|g| g.city_state),
            cover_url: item.event.cover_url,
            organizer_name: item.calendar.name,
            organizer_avatar_url: item.calendar.avatar_url,
            organizer_description: item.calendar.description_short,
            url: item.url,
        }
    }
}

/// Convert raw dataset items, skipping (and logging) malformed entries.
fn convert_items(items: &[Value]) -> Vec<EventRecord> {
    let mut skipped = 0usize;
    let events: Vec<EventRecord> = items
        .iter()
        .filter_map(|item| match serde_json::from_value::<DatasetItem>(item.clone()) {
            Ok(item) => Some(EventRecord::from(item)),
            Err(_) => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        tracing::warn!(skipped, "Skipped malformed dataset items");
    }
    events
}

/// Built-in sample events, the terminal fallback.
pub fn sample_events() -> Vec<EventRecord> {
    vec![
        EventRecord {
            id: "evt-sample-1".to_string(),
            name: "Tech Innovation Summit 2025".to_string(),
            start_at: "2025-06-15T09:00:00Z".to_string(),
            end_at: "2025-06-15T18:00:00Z".to_string(),
            location_type: LocationType::Offline,
            city_state: Some("San Francisco, California".to_string()),
            cover_url: Some(
                "https://images.unsplash.com/photo-1540575467063-178a50c2df87?w=800".to_string(),
            ),
            organizer_name: "Tech Events SF".to_string(),
            organizer_avatar_url: Some(
                "https://images.unsplash.com/photo-1519389950473-47ba0277781c?w=200".to_string(),
            ),
            organizer_description: Some(
                "Bringing together tech innovators and entrepreneurs".to_string(),
            ),
            url: None,
        },
        EventRecord {
            id: "evt-sample-2".to_string(),
            name: "Virtual Design Workshop".to_string(),
            start_at: "2025-06-20T14:00:00Z".to_string(),
            end_at: "2025-06-20T16:00:00Z".to_string(),
            location_type: LocationType::Online,
            city_state: None,
            cover_url: Some(
                "https://images.unsplash.com/photo-1561070791-2526d30994b5?w=800".to_string(),
            ),
            organizer_name: "Creative Minds".to_string(),
            organizer_avatar_url: Some(
                "https://images.unsplash.com/photo-1541462608143-67571c6738dd?w=200".to_string(),
            ),
            organizer_description: Some(
                "Learn from the best designers in the industry".to_string(),
            ),
            url: None,
        },
        EventRecord {
            id: "evt-sample-3".to_string(),
            name: "Startup Networking Night".to_string(),
            start_at: "2025-06-25T18:00:00Z".to_string(),
            end_at: "2025-06-25T21:00:00Z".to_string(),
            location_type: LocationType::Offline,
            city_state: Some("New York, New York".to_string()),
            cover_url: Some(
                "https://images.unsplash.com/photo-1511578314322-379afb476865?w=800".to_string(),
            ),
            organizer_name: "Startup Hub NYC".to_string(),
            organizer_avatar_url: Some(
                "https://images.unsplash.com/photo-1556761175-b413da4baf72?w=200".to_string(),
            ),
            organizer_description: Some(
                "Connect with fellow entrepreneurs and investors".to_string(),
            ),
            url: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_events_cover_both_formats() {
        let events = sample_events();
        assert_eq!(events.len(), 3);
        assert!(events
            .iter()
            .any(|e| e.location_type == LocationType::Online));
        assert!(events
            .iter()
            .any(|e| e.location_type == LocationType::Offline));
    }

    #[test]
    fn test_dataset_item_flattens() {
        let raw = serde_json::json!({
            "api_id": "evt-1",
            "event": {
                "name": "Tech Night",
                "start_at": "2025-06-15T09:00:00.000Z",
                "end_at": "2025-06-15T18:00:00.000Z",
                "location_type": "offline",
                "geo_address_info": { "city_state": "Austin, Texas" }
            },
            "calendar": {
                "name": "ATX Devs",
                "description_short": "Developer community"
            },
            "url": "tech-night"
        });

        let events = convert_items(&[raw]);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.id, "evt-1");
        assert_eq!(event.city_state.as_deref(), Some("Austin, Texas"));
        assert_eq!(event.organizer_name, "ATX Devs");
        assert_eq!(event.external_url().as_deref(), Some("https://lu.ma/tech-night"));
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let good = serde_json::json!({
            "api_id": "evt-1",
            "event": {
                "name": "A",
                "start_at": "2025-06-15T09:00:00Z",
                "end_at": "2025-06-15T10:00:00Z",
                "location_type": "online"
            },
            "calendar": { "name": "B" }
        });
        let bad = serde_json::json!({ "unexpected": true });

        let events = convert_items(&[bad, good]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "evt-1");
    }
}
