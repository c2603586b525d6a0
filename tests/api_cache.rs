// tests/api_cache.rs
//
// Session-cache behavior of /api/events via the `X-Event-Cache` header:
// - MISS then HIT for consecutive calls
// - /api/refresh clears the memo, turning the next call into a MISS
// - expiry after the fixed TTL turns the next call into a MISS
//
// The memo holds exactly one un-keyworded batch; keyword/limit apply per
// request on top of it, so a keyworded call still HITs.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use tokio::time::sleep;
use tower::ServiceExt as _;

use geosentience::activity::ActivityConfig;
use geosentience::ingest::providers::gdelt::GdeltProvider;
use geosentience::ingest::IngestPipeline;
use geosentience::session::SessionState;
use geosentience::{api, AppState, FetchQuery};

fn app_with_ttl(ttl: Duration) -> Router {
    let body = fs::read_to_string("tests/fixtures/gdelt_events.json")
        .expect("missing tests/fixtures/gdelt_events.json");
    let pipeline = IngestPipeline::new(
        vec![Box::new(GdeltProvider::from_fixture_str(&body))],
        FetchQuery::default(),
        true,
    );
    api::router(AppState {
        pipeline: Arc::new(pipeline),
        session: Arc::new(SessionState::new(ttl)),
        activity: ActivityConfig::default(),
        max_records: 100,
        cesium_ion_token: String::new(),
    })
}

async fn get_events(app: &Router, uri: &str) -> (StatusCode, HeaderMap) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request build");
    let resp = app.clone().oneshot(req).await.expect("router response");
    (resp.status(), resp.headers().clone())
}

fn cache_signal(headers: &HeaderMap) -> String {
    headers
        .get("x-event-cache")
        .expect("x-event-cache header must be present")
        .to_str()
        .expect("header must be valid ASCII")
        .to_string()
}

#[tokio::test]
async fn miss_then_hit_for_consecutive_calls() {
    let app = app_with_ttl(Duration::from_secs(60));

    let (s1, h1) = get_events(&app, "/api/events").await;
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(cache_signal(&h1), "MISS", "first call should fetch");

    let (s2, h2) = get_events(&app, "/api/events").await;
    assert_eq!(s2, StatusCode::OK);
    assert_eq!(cache_signal(&h2), "HIT", "second call should be served from memo");
}

#[tokio::test]
async fn keyworded_call_hits_the_same_memo() {
    let app = app_with_ttl(Duration::from_secs(60));

    let (_, h1) = get_events(&app, "/api/events").await;
    assert_eq!(cache_signal(&h1), "MISS");

    // Keyword filtering happens per request on the cached batch.
    let (_, h2) = get_events(&app, "/api/events?keyword=ukraine").await;
    assert_eq!(cache_signal(&h2), "HIT");
}

#[tokio::test]
async fn refresh_clears_the_memo() {
    let app = app_with_ttl(Duration::from_secs(60));

    let (_, h1) = get_events(&app, "/api/events").await;
    assert_eq!(cache_signal(&h1), "MISS");
    let (_, h2) = get_events(&app, "/api/events").await;
    assert_eq!(cache_signal(&h2), "HIT");

    let req = Request::builder()
        .method("POST")
        .uri("/api/refresh")
        .body(Body::empty())
        .expect("build POST /api/refresh");
    let resp = app.clone().oneshot(req).await.expect("oneshot refresh");
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, h3) = get_events(&app, "/api/events").await;
    assert_eq!(
        cache_signal(&h3),
        "MISS",
        "after refresh the memo must be gone"
    );
}

#[tokio::test]
async fn memo_expires_after_ttl() {
    const TTL_MS: u64 = 50;
    let app = app_with_ttl(Duration::from_millis(TTL_MS));

    let (_, h1) = get_events(&app, "/api/events").await;
    assert_eq!(cache_signal(&h1), "MISS");
    let (_, h2) = get_events(&app, "/api/events").await;
    assert_eq!(cache_signal(&h2), "HIT");

    // Wait well over TTL to avoid boundary flakes.
    sleep(Duration::from_millis(TTL_MS * 5)).await;

    let (_, h3) = get_events(&app, "/api/events").await;
    assert_eq!(
        cache_signal(&h3),
        "MISS",
        "after TTL expiry the next call must refetch"
    );
    let (_, h4) = get_events(&app, "/api/events").await;
    assert_eq!(cache_signal(&h4), "HIT");
}
