// src/ingest/types.rs
use anyhow::Result;

/// One upstream record, kept in its source shape until normalization.
/// GDELT JSON rows are objects, the TSV export yields positional arrays,
/// GeoJSON sources yield feature objects. Nothing here is trusted yet.
pub type RawEventRecord = serde_json::Value;

/// Payload shapes the normalizer knows how to read. Field names (or column
/// positions) differ per tag; see `normalize` for the mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSchema {
    /// GDELT v2 events query, `format=json` (`{"events": [...]}` or a bare array).
    GdeltEvents,
    /// GDELT v2 event-table export: headerless tab-delimited rows, 61 columns.
    GdeltTsv,
    /// ACLED-style GeoJSON `FeatureCollection`.
    AcledGeoJson,
}

/// The stable event shape consumed by the globe and chart collaborators.
/// Latitude/longitude are guaranteed present and finite; string fields are
/// never empty (placeholders fill the gaps).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormalizedEvent {
    pub id: u32,
    pub title: String,
    /// Serialized as `lat`/`lon`: the wire names the globe collaborator expects.
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    pub location: String,
    /// Free-text date as the source reported it ("20240101", "2024-01-01", ...).
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatalities: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

/// Where a batch came from. `Empty` means every source (and the hotspot
/// fallback, if disabled) produced nothing — distinct from "not yet
/// fetched", which is the session cache holding `None`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchOrigin {
    Live { provider: String },
    HotspotFallback,
    Empty,
}

/// One fetch-and-normalize result, held in session state until refresh.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EventBatch {
    pub origin: BatchOrigin,
    /// Unix seconds at pipeline completion.
    pub fetched_at: u64,
    pub events: Vec<NormalizedEvent>,
}

impl EventBatch {
    pub fn empty(fetched_at: u64) -> Self {
        Self {
            origin: BatchOrigin::Empty,
            fetched_at,
            events: Vec::new(),
        }
    }
}

/// Parameters forwarded to upstream queries. The user keyword is NOT part
/// of this: keyword filtering happens client-side after normalization.
#[derive(Debug, Clone, Copy)]
pub struct FetchQuery {
    pub lookback_hours: u32,
    pub max_records: usize,
}

impl Default for FetchQuery {
    fn default() -> Self {
        Self {
            lookback_hours: 72,
            max_records: 100,
        }
    }
}

#[async_trait::async_trait]
pub trait EventProvider: Send + Sync {
    /// Fetch raw upstream records. Providers may fail; the pipeline is the
    /// fail-soft boundary and converts any `Err` into zero records.
    async fn fetch_raw(&self, query: &FetchQuery) -> Result<Vec<RawEventRecord>>;
    fn schema(&self) -> SourceSchema;
    fn name(&self) -> &'static str;
}
