//! Persisted key layout shared by every adapter.
//!
//! - `currency:{CODE}` holds the per-unit rate as a decimal string
//! - `last_update` holds the as-of date as `YYYY-MM-DD`
//!
//! No schema version, no expiry.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use rates_types::{CurrencyCode, Rate, StoreError};

pub const RATE_PREFIX: &str = "currency:";
pub const AS_OF_KEY: &str = "last_update";

const AS_OF_FORMAT: &str = "%Y-%m-%d";

pub fn rate_key(code: &CurrencyCode) -> String {
    format!("{}{}", RATE_PREFIX, code)
}

/// Extracts the code from a `currency:*` key.
pub fn code_from_key(key: &str) -> Option<CurrencyCode> {
    key.strip_prefix(RATE_PREFIX)
        .and_then(|code| CurrencyCode::new(code).ok())
}

pub fn encode_rate(rate: &Rate) -> String {
    rate.per_unit_value.normalize().to_string()
}

/// Decodes a stored rate. Scientific notation is accepted for values
/// written by float-based writers (`7.35e-05`).
pub fn decode_rate(code: &CurrencyCode, value: &str) -> Result<Rate, StoreError> {
    let corrupt = || StoreError::Corrupt {
        key: rate_key(code),
        value: value.to_string(),
    };
    let text = value.trim();
    let number = Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| corrupt())?;
    Rate::new(code.clone(), number).map_err(|_| corrupt())
}

pub fn encode_as_of(date: NaiveDate) -> String {
    date.format(AS_OF_FORMAT).to_string()
}

pub fn decode_as_of(value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value.trim(), AS_OF_FORMAT).map_err(|_| StoreError::Corrupt {
        key: AS_OF_KEY.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    #[test]
    fn test_rate_key_layout() {
        assert_eq!(rate_key(&usd()), "currency:USD");
        assert_eq!(code_from_key("currency:USD"), Some(usd()));
        assert_eq!(code_from_key("last_update"), None);
        assert_eq!(code_from_key("currency:??"), None);
    }

    #[test]
    fn test_rate_value_encoding() {
        let rate = Rate::new(usd(), "73.5000".parse().unwrap()).unwrap();
        assert_eq!(encode_rate(&rate), "73.5");
        assert_eq!(decode_rate(&usd(), "73.5").unwrap(), rate);
    }

    #[test]
    fn test_decode_accepts_float_spellings() {
        let rate = decode_rate(&usd(), "7.35e-05").unwrap();
        assert_eq!(rate.per_unit_value, "0.0000735".parse::<Decimal>().unwrap());

        let rate = decode_rate(&usd(), "1.0").unwrap();
        assert_eq!(rate.per_unit_value, Decimal::ONE);
    }

    #[test]
    fn test_decode_rejects_corrupt_values() {
        for bad in ["", "abc", "0", "-1.5"] {
            assert!(
                matches!(decode_rate(&usd(), bad), Err(StoreError::Corrupt { .. })),
                "{bad:?} should be corrupt"
            );
        }
    }

    #[test]
    fn test_as_of_encoding() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(encode_as_of(date), "2024-01-10");
        assert_eq!(decode_as_of("2024-01-10").unwrap(), date);
        assert!(decode_as_of("10.01.2024").is_err());
    }
}
