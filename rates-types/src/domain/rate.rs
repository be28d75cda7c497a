//! Raw feed records and canonical per-unit rates.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

use crate::domain::CurrencyCode;
use crate::domain::update::SkippedRecord;
use crate::error::{DomainError, NormalizationError};

/// Parses a feed decimal, accepting either `.` or `,` as the decimal point.
pub fn parse_decimal(raw: &str) -> Result<Decimal, DomainError> {
    let text = raw.trim().replace(',', ".");
    if text.is_empty() {
        return Err(DomainError::InvalidDecimal(raw.to_string()));
    }
    Decimal::from_str(&text).map_err(|_| DomainError::InvalidDecimal(raw.to_string()))
}

/// One entry of the daily feed, as published.
///
/// `unit_value` is the price of `nominal` units of `code` in the base currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCurrencyRecord {
    pub code: CurrencyCode,
    pub unit_value: Decimal,
    pub nominal: Decimal,
    pub as_of: NaiveDate,
}

/// Output of parsing one feed document.
///
/// Entries that could not be read are reported in `skipped` instead of
/// failing the whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeed {
    pub as_of: NaiveDate,
    pub records: Vec<RawCurrencyRecord>,
    pub skipped: Vec<SkippedRecord>,
}

/// Value of exactly one unit of `code`, expressed in the base currency.
///
/// Invariant: `per_unit_value > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Rate {
    pub code: CurrencyCode,
    #[schema(value_type = String, example = "73.5")]
    pub per_unit_value: Decimal,
}

impl Rate {
    /// Creates a rate, rejecting non-positive values.
    pub fn new(code: CurrencyCode, per_unit_value: Decimal) -> Result<Self, NormalizationError> {
        if per_unit_value <= Decimal::ZERO {
            return Err(NormalizationError::NonPositive {
                code,
                field: "per-unit value",
                value: per_unit_value,
            });
        }
        Ok(Self {
            code,
            per_unit_value: per_unit_value.normalize(),
        })
    }

    /// The implicit rate of the base currency against itself.
    pub fn base(code: CurrencyCode) -> Self {
        Self {
            code,
            per_unit_value: Decimal::ONE,
        }
    }

    /// Converts a raw record into the value of a single unit.
    pub fn normalize(record: &RawCurrencyRecord) -> Result<Self, NormalizationError> {
        if record.nominal <= Decimal::ZERO {
            return Err(NormalizationError::NonPositive {
                code: record.code.clone(),
                field: "nominal",
                value: record.nominal,
            });
        }
        if record.unit_value <= Decimal::ZERO {
            return Err(NormalizationError::NonPositive {
                code: record.code.clone(),
                field: "value",
                value: record.unit_value,
            });
        }
        let per_unit = record
            .unit_value
            .checked_div(record.nominal)
            .ok_or_else(|| NormalizationError::Overflow {
                code: record.code.clone(),
            })?;
        Self::new(record.code.clone(), per_unit)
    }

    /// Per-unit value rounded half away from zero to two decimal places.
    pub fn rounded(&self) -> Decimal {
        self.per_unit_value
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Every writer path goes through this one function.
pub fn normalize(record: &RawCurrencyRecord) -> Result<Rate, NormalizationError> {
    Rate::normalize(record)
}
