//! # Rates Hex
//!
//! Application layer and inbound adapters for the exchange rate cache.
//!
//! ## Architecture
//!
//! - `update` - one refresh pass: fetch → parse → normalize → store
//! - `scheduler` - startup pass plus fixed-interval passes, never overlapping
//! - `query` - read-only view of the store (rates, conversions, listings)
//! - `inbound/` - chat command surface and HTTP adapter (Axum server)
//!
//! Every writer goes through `UpdateCycle`; there is no other code path that
//! stores rates. Services are generic over the `FeedSource` and `RateStore`
//! ports so adapters can be swapped without code changes.

pub mod inbound;
pub mod openapi;
pub mod query;
pub mod scheduler;
pub mod update;


pub use query::QueryService;
pub use scheduler::{Refresh, Scheduler, SchedulerHandle, SchedulerState, Tick};
pub use update::UpdateCycle;
