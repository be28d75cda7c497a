//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod feed;
mod store;

pub use feed::FeedSource;
pub use store::RateStore;
