// src/ingest/providers/gdelt.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::Value;

use crate::ingest::types::{EventProvider, FetchQuery, RawEventRecord, SourceSchema};

/// Fixed topic term sent upstream. The user keyword never reaches GDELT;
/// it filters client-side after normalization.
pub const UPSTREAM_TOPIC: &str = "conflict";

/// GDELT v2 events provider, `format=json`. The API answers with
/// `{"events": [...]}` on good days, a bare array on others, and the
/// literal string `null` when nothing matched.
pub struct GdeltProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl GdeltProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building gdelt http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        })
    }

    fn parse_events_from_str(s: &str) -> Result<Vec<RawEventRecord>> {
        let t0 = std::time::Instant::now();

        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Vec::new());
        }

        let v: Value = serde_json::from_str(trimmed).context("parsing gdelt events json")?;
        let records = match v {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("events") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_raw_records_total").increment(records.len() as u64);
        Ok(records)
    }
}

#[async_trait]
impl EventProvider for GdeltProvider {
    async fn fetch_raw(&self, query: &FetchQuery) -> Result<Vec<RawEventRecord>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_events_from_str(s),
            Mode::Http { url, client } => {
                let full = build_events_url(url, query, "json");
                let body = match client
                    .get(&full)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                {
                    Ok(resp) => resp.text().await.context("gdelt http .text()")?,
                    Err(e) => {
                        tracing::warn!(error = ?e, provider = "gdelt", "provider http error");
                        counter!("ingest_provider_errors_total").increment(1);
                        return Err(e).context("gdelt http get()");
                    }
                };
                Self::parse_events_from_str(&body)
            }
        }
    }

    fn schema(&self) -> SourceSchema {
        SourceSchema::GdeltEvents
    }

    fn name(&self) -> &'static str {
        "gdelt"
    }
}

/// Query-string builder shared by the JSON and export variants. Timestamps
/// use GDELT's `YYYYMMDDHHMMSS` form.
pub(crate) fn build_events_url(base: &str, query: &FetchQuery, format: &str) -> String {
    let end = chrono::Utc::now();
    let start = end - chrono::Duration::hours(i64::from(query.lookback_hours));
    format!(
        "{base}?query={topic}&mode=EventOnly&format={format}&maxrecords={max}&startdatetime={start}&enddatetime={end}",
        topic = urlencoding::encode(UPSTREAM_TOPIC),
        max = query.max_records,
        start = start.format("%Y%m%d%H%M%S"),
        end = end.format("%Y%m%d%H%M%S"),
    )
}
