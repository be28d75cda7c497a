//! Rate store port trait.
//!
//! This is the shared cache between writers (update cycles) and readers
//! (query service). Adapters (in-memory, SQLite, PostgreSQL) implement it.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::{CurrencyCode, Rate};
use crate::dto::StoreEntry;
use crate::error::StoreError;

/// Key-value cache of per-unit rates plus one as-of marker.
///
/// Every key is written independently: there is no multi-key transaction,
/// and a reader may observe rates from two different refresh passes.
/// Writes are last-write-wins per key; nothing is ever deleted.
#[async_trait::async_trait]
pub trait RateStore: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Rates
    // ─────────────────────────────────────────────────────────────────────────────

    /// Upserts the rate stored under `rate.code`.
    async fn set(&self, rate: &Rate) -> Result<(), StoreError>;

    /// Looks up a rate. `None` means the code was never written.
    async fn get(&self, code: &CurrencyCode) -> Result<Option<Rate>, StoreError>;

    /// Lists every code that has a stored rate.
    async fn list_codes(&self) -> Result<BTreeSet<CurrencyCode>, StoreError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // As-of marker
    // ─────────────────────────────────────────────────────────────────────────────

    /// Overwrites the as-of marker.
    async fn set_as_of(&self, date: NaiveDate) -> Result<(), StoreError>;

    /// Reads the as-of marker. `None` on a cold store.
    async fn get_as_of(&self) -> Result<Option<NaiveDate>, StoreError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Diagnostics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Dumps every stored key and value verbatim, ordered by key.
    async fn entries(&self) -> Result<Vec<StoreEntry>, StoreError>;
}

#[async_trait::async_trait]
impl<S: RateStore + ?Sized> RateStore for Arc<S> {
    async fn set(&self, rate: &Rate) -> Result<(), StoreError> {
        (**self).set(rate).await
    }

    async fn get(&self, code: &CurrencyCode) -> Result<Option<Rate>, StoreError> {
        (**self).get(code).await
    }

    async fn list_codes(&self) -> Result<BTreeSet<CurrencyCode>, StoreError> {
        (**self).list_codes().await
    }

    async fn set_as_of(&self, date: NaiveDate) -> Result<(), StoreError> {
        (**self).set_as_of(date).await
    }

    async fn get_as_of(&self) -> Result<Option<NaiveDate>, StoreError> {
        (**self).get_as_of().await
    }

    async fn entries(&self) -> Result<Vec<StoreEntry>, StoreError> {
        (**self).entries().await
    }
}
