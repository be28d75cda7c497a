//! HTTP-level tests for the rate API.
//!
//! Exercise the full router (handlers, error mapping, rate limiting) over an
//! in-memory store filled by a real update pass.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use rates_hex::{QueryService, Refresh, Scheduler, Tick, UpdateCycle, inbound::HttpServer};
use rates_repo::MemoryStore;
use rates_types::{CurrencyCode, FeedSource, FetchError};
use rust_decimal::Decimal;
use tower::ServiceExt;

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ValCurs Date="10.01.2024" name="Foreign Currency Market">
  <Valute><CharCode>USD</CharCode><Nominal>1</Nominal><Value>73,5000</Value></Valute>
  <Valute><CharCode>JPY</CharCode><Nominal>100</Nominal><Value>50,0000</Value></Valute>
</ValCurs>"#;

struct CannedFeed;

#[async_trait]
impl FeedSource for CannedFeed {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        Ok(FEED.as_bytes().to_vec())
    }
}

struct DownFeed;

#[async_trait]
impl FeedSource for DownFeed {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Transport("HTTP 503 Service Unavailable".into()))
    }
}

/// Always reports a pass already in flight.
struct BusyRefresher;

#[async_trait]
impl Refresh for BusyRefresher {
    async fn refresh(&self) -> Tick {
        Tick::Skipped
    }
}

fn rub() -> CurrencyCode {
    CurrencyCode::new("RUB").unwrap()
}

/// Helper to build a server over a store that already holds `FEED`.
async fn populated_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    assert!(UpdateCycle::new(CannedFeed, store.clone()).run().await.is_success());
    HttpServer::new(QueryService::new(store, rub())).router()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = populated_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_get_rate() {
    let app = populated_app().await;

    let response = app.clone().oneshot(get("/api/rates/jpy")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["code"], "JPY");
    assert_eq!(body["per_unit_value"], "0.5");

    let response = app.clone().oneshot(get("/api/rates/CHF")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(response).await["code"], 404);

    let response = app.oneshot(get("/api/rates/DOLLAR")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listing() {
    let app = populated_app().await;

    let response = app.clone().oneshot(get("/api/rates")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["as_of"], "2024-01-10");
    assert_eq!(body["rates"].as_array().unwrap().len(), 1); // only USD of USD,EUR,GBP

    let response = app.oneshot(get("/api/rates?codes=USD,JPY,EUR")).await.unwrap();
    let body = json(response).await;
    assert_eq!(body["rates"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_convert() {
    let app = populated_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/convert?from=USD&to=JPY&amount=100"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    let result: Decimal = body["result"].as_str().unwrap().parse().unwrap();
    assert_eq!(result, Decimal::from(14700));
    assert_eq!(body["as_of"], "2024-01-10");

    let response = app
        .clone()
        .oneshot(get("/api/convert?from=USD&to=JPY&amount=lots"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/api/convert?from=USD&to=JPY&amount=-5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get("/api/convert?from=USD&to=CHF&amount=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_debug_dump() {
    let app = populated_app().await;

    let response = app.oneshot(get("/api/debug")).await.unwrap();

    let body = json(response).await;
    let keys: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["key"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(keys, ["currency:JPY", "currency:USD", "last_update"]);
}

#[tokio::test]
async fn test_command_endpoint() {
    let app = populated_app().await;

    let response = app
        .oneshot(post("/api/command", "/exchange USD JPY 100"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["reply"], "100 USD = 14700.00 JPY");
}

#[tokio::test]
async fn test_refresh_runs_a_pass() {
    let store = Arc::new(MemoryStore::new());
    let scheduler = Scheduler::new(
        UpdateCycle::new(CannedFeed, store.clone()),
        Scheduler::<CannedFeed, Arc<MemoryStore>>::DEFAULT_PERIOD,
    );
    let app = HttpServer::new(QueryService::new(store, rub()))
        .with_refresher(Arc::new(scheduler.handle()))
        .router();

    let response = app.clone().oneshot(post("/api/refresh", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["written"], 2);
    assert_eq!(body["skipped"], 0);

    let response = app.oneshot(get("/api/rates/USD")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_conflict_and_upstream_errors() {
    let store = Arc::new(MemoryStore::new());
    let app = HttpServer::new(QueryService::new(store.clone(), rub()))
        .with_refresher(Arc::new(BusyRefresher))
        .router();
    let response = app.oneshot(post("/api/refresh", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let scheduler = Scheduler::new(
        UpdateCycle::new(DownFeed, store.clone()),
        Scheduler::<DownFeed, Arc<MemoryStore>>::DEFAULT_PERIOD,
    );
    let app = HttpServer::new(QueryService::new(store.clone(), rub()))
        .with_refresher(Arc::new(scheduler.handle()))
        .router();
    let response = app.oneshot(post("/api/refresh", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let app = HttpServer::new(QueryService::new(store, rub())).router();
    let response = app.oneshot(post("/api/refresh", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = populated_app().await;

    let response = app.oneshot(get("/api-docs/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert!(body["paths"]["/api/convert"].is_object());
}

#[tokio::test]
async fn test_rate_limiting_returns_429_when_exceeded() {
    let store = Arc::new(MemoryStore::new());
    let app = HttpServer::new(QueryService::new(store, rub()))
        .with_rate_limit(3)
        .router();

    for i in 1..=3 {
        let response = app.clone().oneshot(get("/api/rates")).await.unwrap();
        assert_ne!(
            response.status(),
            StatusCode::TOO_MANY_REQUESTS,
            "Request {} should not be rate limited",
            i
        );
    }

    let response = app.clone().oneshot(get("/api/rates")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(json(response).await["retry_after_seconds"].is_number());

    // Health is exempt
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Another client has its own bucket
    let request = Request::builder()
        .uri("/api/rates")
        .header("X-Forwarded-For", "10.0.0.7")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
