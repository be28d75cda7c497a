//! HTTP Server configuration and startup.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use rates_types::RateStore;

use super::handlers::{self, AppState};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::openapi::ApiDoc;
use crate::{QueryService, Refresh};

/// HTTP Server for the exchange rate API.
pub struct HttpServer<S: RateStore> {
    query: QueryService<S>,
    refresher: Option<Arc<dyn Refresh>>,
    rate_limiter: Arc<RateLimiterState>,
}

impl<S: RateStore> HttpServer<S> {
    /// Creates a read-only server over the given query service.
    pub fn new(query: QueryService<S>) -> Self {
        Self {
            query,
            refresher: None,
            rate_limiter: Arc::new(RateLimiterState::default()), // 100 req/min default
        }
    }

    /// Sets the per-client request quota.
    pub fn with_rate_limit(mut self, requests_per_minute: u32) -> Self {
        self.rate_limiter = Arc::new(RateLimiterState::new(
            requests_per_minute,
            Duration::from_secs(60),
        ));
        self
    }

    /// Enables `POST /api/refresh`, normally backed by a `SchedulerHandle`.
    pub fn with_refresher(mut self, refresher: Arc<dyn Refresh>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Builds the Axum router with all routes.
    pub fn router(self) -> Router {
        let state = Arc::new(AppState {
            query: self.query,
            refresher: self.refresher,
        });

        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/rates", get(handlers::list_rates::<S>))
            .route("/api/rates/{code}", get(handlers::get_rate::<S>))
            .route("/api/convert", get(handlers::convert::<S>))
            .route("/api/debug", get(handlers::debug::<S>))
            .route("/api/command", post(handlers::command::<S>))
            .route("/api/refresh", post(handlers::refresh::<S>))
            .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
