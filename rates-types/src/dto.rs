//! Data Transfer Objects (DTOs) for query responses.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CurrencyCode, Rate, UpdateReport};

// ─────────────────────────────────────────────────────────────────────────────
// Query DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Rates for a set of codes plus the store's as-of marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RateListing {
    pub rates: Vec<Rate>,
    /// Date the cached rate set is valid for; absent on a cold store
    #[schema(value_type = Option<String>, example = "2024-01-10")]
    pub as_of: Option<NaiveDate>,
}

/// Result of converting an amount between two currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Conversion {
    #[schema(value_type = String, example = "100")]
    pub amount: Decimal,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Unrounded `amount * rate(from) / rate(to)`
    #[schema(value_type = String, example = "14700")]
    pub result: Decimal,
    #[schema(value_type = Option<String>, example = "2024-01-10")]
    pub as_of: Option<NaiveDate>,
}

impl Conversion {
    /// Result rounded half away from zero to two decimal places.
    pub fn rounded(&self) -> Decimal {
        self.result
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Query string of `GET /api/convert`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConvertQuery {
    #[schema(example = "USD")]
    pub from: String,
    #[schema(example = "JPY")]
    pub to: String,
    /// Decimal amount; `,` is accepted as decimal point
    #[schema(example = "100")]
    pub amount: String,
}

/// Query string of `GET /api/rates`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ListingQuery {
    /// Comma-separated codes; the configured list is used when absent
    #[schema(example = "USD,EUR,GBP")]
    pub codes: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Diagnostics DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// One raw key/value pair as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoreEntry {
    #[schema(example = "currency:USD")]
    pub key: String,
    #[schema(example = "73.5")]
    pub value: String,
}

impl StoreEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Reply to a chat command sent over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommandReply {
    pub reply: String,
}

/// Summary returned by a manual refresh.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    #[schema(value_type = String, example = "2024-01-10")]
    pub as_of: NaiveDate,
    #[schema(example = 43)]
    pub written: usize,
    #[schema(example = 0)]
    pub skipped: usize,
    /// Human-readable reasons for every skipped feed entry
    pub skip_reasons: Vec<String>,
}

impl From<&UpdateReport> for RefreshResponse {
    fn from(report: &UpdateReport) -> Self {
        Self {
            as_of: report.as_of,
            written: report.written_count(),
            skipped: report.skipped_count(),
            skip_reasons: report.skipped.iter().map(ToString::to_string).collect(),
        }
    }
}
