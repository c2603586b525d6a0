// src/ingest/mod.rs
pub mod hotspots;
pub mod normalize;
pub mod providers;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::config::IngestConfig;
use crate::ingest::providers::{
    acled::AcledProvider, gdelt::GdeltProvider, gdelt_export::GdeltExportProvider,
};
use crate::ingest::types::{BatchOrigin, EventBatch, EventProvider, FetchQuery, NormalizedEvent};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_raw_records_total",
            "Raw records parsed from upstream sources."
        );
        describe_counter!(
            "ingest_kept_total",
            "Events kept after normalization (usable coordinates)."
        );
        describe_counter!(
            "ingest_dropped_total",
            "Records dropped for missing or malformed coordinates."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_counter!(
            "ingest_fallback_total",
            "Runs that ended on the hotspot fallback set."
        );
        describe_histogram!("ingest_parse_ms", "Provider parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when the ingest pipeline last ran."
        );
    });
}

/// The fail-soft fetch boundary. Providers are tried in order; the first
/// whose normalized output is non-empty wins. Transport and parse failures
/// count as zero records from that source. When everything comes back empty
/// the fixed hotspot set is served (unless disabled), so the worst outcome
/// for a caller is an empty batch — never an error.
pub struct IngestPipeline {
    providers: Vec<Box<dyn EventProvider>>,
    query: FetchQuery,
    hotspot_fallback: bool,
}

impl IngestPipeline {
    pub fn new(
        providers: Vec<Box<dyn EventProvider>>,
        query: FetchQuery,
        hotspot_fallback: bool,
    ) -> Self {
        Self {
            providers,
            query,
            hotspot_fallback,
        }
    }

    /// Standard chain from config: GDELT events JSON, then the GDELT
    /// event-table export, then ACLED GeoJSON.
    pub fn from_config(cfg: &IngestConfig) -> anyhow::Result<Self> {
        let timeout = std::time::Duration::from_secs(cfg.timeout_secs);
        let providers: Vec<Box<dyn EventProvider>> = vec![
            Box::new(GdeltProvider::from_url(&cfg.gdelt_url, timeout)?),
            Box::new(GdeltExportProvider::from_url(&cfg.gdelt_url, timeout)?),
            Box::new(AcledProvider::from_url(&cfg.acled_url, timeout)?),
        ];
        Ok(Self::new(
            providers,
            FetchQuery {
                lookback_hours: cfg.lookback_hours,
                max_records: cfg.max_records,
            },
            cfg.hotspot_fallback,
        ))
    }

    /// Run the fetch-and-normalize chain once. Never errors.
    pub async fn run_once(&self) -> EventBatch {
        ensure_metrics_described();

        for p in &self.providers {
            let raw = match p.fetch_raw(&self.query).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = ?e, provider = p.name(), "provider error");
                    counter!("ingest_provider_errors_total").increment(1);
                    continue;
                }
            };

            let events = normalize::normalize(p.schema(), &raw);
            let dropped = raw.len().saturating_sub(events.len());
            counter!("ingest_kept_total").increment(events.len() as u64);
            counter!("ingest_dropped_total").increment(dropped as u64);

            if events.is_empty() {
                continue;
            }

            let now = now_unix();
            gauge!("ingest_pipeline_last_run_ts").set(now as f64);
            tracing::info!(
                provider = p.name(),
                kept = events.len(),
                dropped = dropped,
                "ingest tick"
            );
            return EventBatch {
                origin: BatchOrigin::Live {
                    provider: p.name().to_string(),
                },
                fetched_at: now,
                events,
            };
        }

        let now = now_unix();
        gauge!("ingest_pipeline_last_run_ts").set(now as f64);

        if self.hotspot_fallback {
            let events = hotspots::hotspot_events();
            counter!("ingest_fallback_total").increment(1);
            tracing::info!(kept = events.len(), "all sources empty; serving hotspot set");
            EventBatch {
                origin: BatchOrigin::HotspotFallback,
                fetched_at: now,
                events,
            }
        } else {
            tracing::info!("all sources empty; hotspot fallback disabled");
            EventBatch::empty(now)
        }
    }
}

/// Case-insensitive substring match on the normalized title. Applied
/// client-side after fetch; the upstream query never sees the keyword.
pub fn filter_by_keyword(events: Vec<NormalizedEvent>, keyword: &str) -> Vec<NormalizedEvent> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return events;
    }
    events
        .into_iter()
        .filter(|e| e.title.to_lowercase().contains(&needle))
        .collect()
}

fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(title: &str) -> NormalizedEvent {
        NormalizedEvent {
            id: 0,
            title: title.to_string(),
            latitude: 0.5,
            longitude: 0.5,
            location: "Somewhere".into(),
            date: "20240101".into(),
            fatalities: None,
            tone: None,
            url: None,
            event_type: None,
        }
    }

    #[test]
    fn keyword_filter_is_case_insensitive_substring() {
        let events = vec![ev("Protest in Paris"), ev("Armed clash"), ev("PARIS rally")];
        let out = filter_by_keyword(events, "paris");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn blank_keyword_keeps_everything() {
        let events = vec![ev("A"), ev("B")];
        assert_eq!(filter_by_keyword(events, "   ").len(), 2);
    }

    #[test]
    fn unmatched_keyword_yields_empty_not_error() {
        let events = vec![ev("A")];
        assert!(filter_by_keyword(events, "zzz").is_empty());
    }
}
