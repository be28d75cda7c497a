//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use rates_types::{
    AppError, CommandReply, CurrencyCode, DomainError, ConvertQuery, ListingQuery, QueryError,
    RateStore, RefreshResponse, UpdateResult, parse_decimal,
};

use super::commands;
use crate::{QueryService, Refresh, Tick};

/// Application state shared across handlers.
pub struct AppState<S: RateStore> {
    pub query: QueryService<S>,
    /// Trigger for `POST /api/refresh`; absent when the server runs read-only
    pub refresher: Option<Arc<dyn Refresh>>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError(err.into())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Rates for the requested codes, or for the configured list.
#[tracing::instrument(skip(state))]
pub async fn list_rates<S: RateStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let codes = CurrencyCode::parse_list(params.codes.as_deref().unwrap_or_default())?;

    let listing = if codes.is_empty() {
        state.query.default_listing().await?
    } else {
        state.query.listing(&codes).await?
    };
    Ok(Json(listing))
}

/// Per-unit rate of one currency.
#[tracing::instrument(skip(state))]
pub async fn get_rate<S: RateStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let code = CurrencyCode::new(&code)?;
    let rate = state.query.rate(&code).await?;
    Ok(Json(rate))
}

/// Convert an amount between two currencies.
#[tracing::instrument(skip(state))]
pub async fn convert<S: RateStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ConvertQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let amount = parse_decimal(&params.amount)
        .map_err(|_| AppError::BadRequest("Invalid amount format".into()))?;
    let from = CurrencyCode::new(&params.from)?;
    let to = CurrencyCode::new(&params.to)?;

    let conversion = state.query.convert(amount, &from, &to).await?;
    Ok(Json(conversion))
}

/// Every stored key and value, verbatim.
#[tracing::instrument(skip(state))]
pub async fn debug<S: RateStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.query.snapshot_dump().await?;
    Ok(Json(entries))
}

/// Answer a chat command sent as a plain-text body.
#[tracing::instrument(skip(state, body))]
pub async fn command<S: RateStore>(
    State(state): State<Arc<AppState<S>>>,
    body: String,
) -> impl IntoResponse {
    let reply = commands::respond(&state.query, &body).await;
    Json(CommandReply { reply })
}

/// Run one update pass now, unless one is already running.
#[tracing::instrument(skip(state))]
pub async fn refresh<S: RateStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(refresher) = state.refresher.as_ref() else {
        return Err(AppError::NotFound("Manual refresh is not enabled".into()).into());
    };

    match refresher.refresh().await {
        Tick::Skipped => {
            Err(AppError::Conflict("An update is already running".into()).into())
        }
        Tick::Ran(UpdateResult::Succeeded(report)) => Ok(Json(RefreshResponse::from(&report))),
        Tick::Ran(UpdateResult::Failed(failure)) => Err(AppError::from(failure).into()),
    }
}
