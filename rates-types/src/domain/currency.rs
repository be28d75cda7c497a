//! Currency code value type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::DomainError;

/// Three-letter currency code, always upper case.
///
/// Codes are not checked against a fixed list: whatever the feed publishes
/// is accepted as long as it has the right shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "USD")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses a code, trimming whitespace and upper-casing it.
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let code = raw.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidCurrencyCode(raw.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a comma-separated list such as `USD,eur, GBP`. Empty items are ignored.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, DomainError> {
        raw.split(',')
            .filter(|item| !item.trim().is_empty())
            .map(Self::new)
            .collect()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_uppercased_and_trimmed() {
        let code = CurrencyCode::new(" usd ").unwrap();
        assert_eq!(code.as_str(), "USD");
        assert_eq!(code, "USD".parse().unwrap());
    }

    #[test]
    fn test_code_shape_is_enforced() {
        for bad in ["", "US", "USDT", "U1D", "€€€"] {
            assert!(
                matches!(CurrencyCode::new(bad), Err(DomainError::InvalidCurrencyCode(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_list() {
        let codes = CurrencyCode::parse_list("USD, eur,,GBP ").unwrap();
        let codes: Vec<_> = codes.iter().map(CurrencyCode::as_str).collect();
        assert_eq!(codes, ["USD", "EUR", "GBP"]);

        assert!(CurrencyCode::parse_list("").unwrap().is_empty());
        assert!(CurrencyCode::parse_list("USD,dollar").is_err());
    }

    #[test]
    fn test_code_serde_as_string() {
        let code = CurrencyCode::new("jpy").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"JPY\"");
        let back: CurrencyCode = serde_json::from_str("\"eur\"").unwrap();
        assert_eq!(back.as_str(), "EUR");
        assert!(serde_json::from_str::<CurrencyCode>("\"euro\"").is_err());
    }
}
