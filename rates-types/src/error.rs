//! Error types for the rate cache pipeline.

use rust_decimal::Decimal;

use crate::domain::CurrencyCode;

/// Domain-level errors (value construction failures).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    #[error("Invalid decimal number: {0:?}")]
    InvalidDecimal(String),
}

/// Failure to retrieve the upstream feed.
///
/// Connection errors, timeouts and non-success statuses all land here.
/// Retrying is left to the next scheduled cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Feed transport error: {0}")]
    Transport(String),
}

/// Document-level parse failure. Aborts the whole cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed feed document: {0}")]
    Malformed(String),
}

/// Failure to read a single feed entry. Only that entry is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("Missing element <{0}>")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidCode(DomainError),

    #[error("Element <{field}> is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Unreadable entry: {0}")]
    Unreadable(String),
}

/// Failure to turn a raw record into a per-unit rate. Only that record is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationError {
    #[error("{code}: {field} must be positive, got {value}")]
    NonPositive {
        code: CurrencyCode,
        field: &'static str,
        value: Decimal,
    },

    #[error("{code}: per-unit value is out of range")]
    Overflow { code: CurrencyCode },
}

/// Rate store access failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Corrupt value under {key}: {value:?}")]
    Corrupt { key: String, value: String },
}

/// Why an update cycle left the store without a fresh as-of marker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read-side failures surfaced by the query service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(CurrencyCode),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::UnknownCurrency(code) => {
                AppError::NotFound(format!("Unknown currency: {}", code))
            }
            QueryError::InvalidAmount(msg) => AppError::BadRequest(msg),
            QueryError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<CycleFailure> for AppError {
    fn from(err: CycleFailure) -> Self {
        match err {
            CycleFailure::Store(e) => AppError::Internal(e.to_string()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}
