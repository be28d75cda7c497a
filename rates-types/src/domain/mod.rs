//! Domain models for the rate cache.

pub mod currency;
pub mod rate;
pub mod update;

pub use currency::CurrencyCode;
pub use rate::{ParsedFeed, Rate, RawCurrencyRecord, normalize, parse_decimal};
pub use update::{SkipReason, SkippedRecord, UpdateReport, UpdateResult};
