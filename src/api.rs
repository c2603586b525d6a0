use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::activity::{self, ActivityConfig};
use crate::config::AppConfig;
use crate::ingest::{self, types::BatchOrigin, types::NormalizedEvent, IngestPipeline};
use crate::session::SessionState;

/// Directory the globe/chart assets are served from. The render layer is an
/// external collaborator; this service only hosts its static files.
const UI_DIR: &str = "ui";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub session: Arc<SessionState>,
    pub activity: ActivityConfig,
    pub max_records: usize,
    pub cesium_ion_token: String,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            pipeline: Arc::new(IngestPipeline::from_config(&cfg.ingest)?),
            session: Arc::new(SessionState::new(Duration::from_secs(
                cfg.server.cache_ttl_secs,
            ))),
            activity: cfg.activity,
            max_records: cfg.ingest.max_records,
            cesium_ion_token: cfg.ui.cesium_ion_token.clone(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/events", get(list_events))
        .route("/api/refresh", post(refresh))
        .route("/api/activity", get(activity_series))
        .route("/api/select", get(get_selection).post(post_selection))
        .route("/api/ui/config", get(ui_config))
        .fallback_service(ServeDir::new(UI_DIR))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct EventsQuery {
    keyword: Option<String>,
    limit: Option<usize>,
}

#[derive(serde::Serialize)]
struct EventsResponse {
    origin: BatchOrigin,
    fetched_at: u64,
    count: usize,
    events: Vec<NormalizedEvent>,
}

/// Serve events from the session memo when fresh, otherwise run the ingest
/// chain once. Keyword filter and record cap apply per request on top of the
/// cached batch. By contract this never errors: the worst case is an empty
/// list with origin `empty`.
async fn list_events(
    State(state): State<AppState>,
    Query(q): Query<EventsQuery>,
) -> impl IntoResponse {
    let (batch, hit) = match state.session.cached() {
        Some(b) => (b, true),
        None => {
            let b = state.pipeline.run_once().await;
            state.session.store(b.clone());
            (b, false)
        }
    };

    let mut events = batch.events;
    if let Some(kw) = q.keyword.as_deref() {
        events = ingest::filter_by_keyword(events, kw);
    }
    let cap = q.limit.unwrap_or(state.max_records).min(state.max_records);
    events.truncate(cap);

    let body = EventsResponse {
        origin: batch.origin,
        fetched_at: batch.fetched_at,
        count: events.len(),
        events,
    };
    (
        [("x-event-cache", if hit { "HIT" } else { "MISS" })],
        Json(body),
    )
}

#[derive(serde::Serialize)]
struct RefreshResponse {
    cleared: bool,
}

/// Manual retry action: drop the memoized batch so the next request fetches.
async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    let cleared = state.session.clear();
    tracing::info!(cleared = cleared, "session cache cleared");
    Json(RefreshResponse { cleared })
}

#[derive(serde::Deserialize)]
struct ActivityQuery {
    lat: Option<f64>,
    lon: Option<f64>,
}

async fn activity_series(
    State(state): State<AppState>,
    Query(q): Query<ActivityQuery>,
) -> Json<activity::ActivitySeries> {
    let series = activity::synthetic_series(
        &state.activity,
        q.lat.unwrap_or(0.0),
        q.lon.unwrap_or(0.0),
    );
    Json(series)
}

#[derive(serde::Deserialize)]
struct SelectRequest {
    id: u32,
}

#[derive(serde::Serialize)]
struct SelectionResponse {
    id: Option<u32>,
}

/// Fire-and-forget selection channel from the globe collaborator; only the
/// latest value matters.
async fn post_selection(
    State(state): State<AppState>,
    Json(body): Json<SelectRequest>,
) -> StatusCode {
    state.session.select(body.id);
    StatusCode::NO_CONTENT
}

async fn get_selection(State(state): State<AppState>) -> Json<SelectionResponse> {
    Json(SelectionResponse {
        id: state.session.selected(),
    })
}

#[derive(serde::Serialize)]
struct UiConfigResponse {
    cesium_ion_token: String,
}

/// Render-layer token for the browser. Not used for event retrieval.
async fn ui_config(State(state): State<AppState>) -> Json<UiConfigResponse> {
    Json(UiConfigResponse {
        cesium_ion_token: state.cesium_ion_token.clone(),
    })
}
