// src/ingest/providers/acled.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::Value;

use crate::ingest::types::{EventProvider, FetchQuery, RawEventRecord, SourceSchema};

/// ACLED provider, GeoJSON export. Used as the secondary source when GDELT
/// comes back empty; no API key is sent (the public read endpoint rate-limits
/// instead, and a 4xx simply counts as zero records here).
pub struct AcledProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl AcledProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building acled http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        })
    }

    fn parse_features_from_str(s: &str) -> Result<Vec<RawEventRecord>> {
        let t0 = std::time::Instant::now();

        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Vec::new());
        }

        let v: Value = serde_json::from_str(trimmed).context("parsing acled geojson")?;
        let features = match v {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("features") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_raw_records_total").increment(features.len() as u64);
        Ok(features)
    }
}

#[async_trait]
impl EventProvider for AcledProvider {
    async fn fetch_raw(&self, query: &FetchQuery) -> Result<Vec<RawEventRecord>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_features_from_str(s),
            Mode::Http { url, client } => {
                let full = build_read_url(url, query);
                let body = match client
                    .get(&full)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                {
                    Ok(resp) => resp.text().await.context("acled http .text()")?,
                    Err(e) => {
                        tracing::warn!(error = ?e, provider = "acled", "provider http error");
                        counter!("ingest_provider_errors_total").increment(1);
                        return Err(e).context("acled http get()");
                    }
                };
                Self::parse_features_from_str(&body)
            }
        }
    }

    fn schema(&self) -> SourceSchema {
        SourceSchema::AcledGeoJson
    }

    fn name(&self) -> &'static str {
        "acled"
    }
}

fn build_read_url(base: &str, query: &FetchQuery) -> String {
    let end = chrono::Utc::now().date_naive();
    let lookback_days = i64::from(query.lookback_hours.div_ceil(24)).max(1);
    let start = end - chrono::Duration::days(lookback_days);
    format!(
        "{base}?event_date={start}|{end}&event_date_where=BETWEEN&export_type=geojson&limit={max}",
        start = start.format("%Y-%m-%d"),
        end = end.format("%Y-%m-%d"),
        max = query.max_records,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn feature_collection_and_bare_array_both_parse() {
        let fc = json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "geometry": null, "properties": {}}]
        })
        .to_string();
        assert_eq!(AcledProvider::parse_features_from_str(&fc).unwrap().len(), 1);

        let bare = json!([{"type": "Feature"}]).to_string();
        assert_eq!(
            AcledProvider::parse_features_from_str(&bare).unwrap().len(),
            1
        );
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(AcledProvider::parse_features_from_str("{not json").is_err());
    }

    #[test]
    fn read_url_is_date_bounded() {
        let q = FetchQuery::default();
        let url = build_read_url("https://example.test/read", &q);
        assert!(url.contains("event_date_where=BETWEEN"));
        assert!(url.contains("export_type=geojson"));
        assert!(url.contains("limit=100"));
    }
}
