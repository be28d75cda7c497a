//! # Rates Types
//!
//! Domain types and port traits for the exchange rate cache.
//! This crate has ZERO external IO dependencies - only data structures,
//! normalization rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (CurrencyCode, Rate, update reports)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Error taxonomy for every layer of the pipeline

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    CurrencyCode, ParsedFeed, Rate, RawCurrencyRecord, SkipReason, SkippedRecord, UpdateReport,
    UpdateResult, normalize, parse_decimal,
};
pub use dto::*;
pub use error::{
    AppError, CycleFailure, DomainError, FetchError, NormalizationError, ParseError, QueryError,
    RecordError, StoreError,
};
pub use ports::{FeedSource, RateStore};
