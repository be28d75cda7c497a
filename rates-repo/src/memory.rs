//! In-memory store adapter.
//!
//! Shared within one process only. Used for tests and for running the
//! server without a database.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use rates_types::{CurrencyCode, Rate, RateStore, StoreEntry, StoreError};

use crate::keys::{
    AS_OF_KEY, code_from_key, decode_as_of, decode_rate, encode_as_of, encode_rate, rate_key,
};

/// Concurrent map holding the same string layout the SQL adapters persist.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw value, bypassing encoding. Lets tests plant corrupt data.
    pub fn put_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }
}

#[async_trait]
impl RateStore for MemoryStore {
    async fn set(&self, rate: &Rate) -> Result<(), StoreError> {
        self.entries.insert(rate_key(&rate.code), encode_rate(rate));
        Ok(())
    }

    async fn get(&self, code: &CurrencyCode) -> Result<Option<Rate>, StoreError> {
        // Clone out so the shard lock is released before decoding.
        let value = self.entries.get(&rate_key(code)).map(|v| v.value().clone());
        value.map(|v| decode_rate(code, &v)).transpose()
    }

    async fn list_codes(&self) -> Result<BTreeSet<CurrencyCode>, StoreError> {
        Ok(self
            .entries
            .iter()
            .filter_map(|entry| code_from_key(entry.key()))
            .collect())
    }

    async fn set_as_of(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.entries.insert(AS_OF_KEY.to_string(), encode_as_of(date));
        Ok(())
    }

    async fn get_as_of(&self) -> Result<Option<NaiveDate>, StoreError> {
        let value = self.entries.get(AS_OF_KEY).map(|v| v.value().clone());
        value.map(|v| decode_as_of(&v)).transpose()
    }

    async fn entries(&self) -> Result<Vec<StoreEntry>, StoreError> {
        let mut entries: Vec<StoreEntry> = self
            .entries
            .iter()
            .map(|entry| StoreEntry::new(entry.key(), entry.value()))
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store_tests;

    #[tokio::test]
    async fn test_cold_store() {
        store_tests::cold_store_is_empty(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_round_trip() {
        store_tests::rates_round_trip(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        store_tests::last_write_wins_per_key(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_as_of_marker() {
        store_tests::as_of_marker_overwrites(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_entries_dump() {
        store_tests::entries_are_verbatim(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_corrupt_value_is_reported() {
        let store = MemoryStore::new();
        store.put_raw("currency:USD", "not-a-number");
        store.put_raw("last_update", "someday");

        let usd = CurrencyCode::new("USD").unwrap();
        assert!(matches!(store.get(&usd).await, Err(StoreError::Corrupt { .. })));
        assert!(matches!(store.get_as_of().await, Err(StoreError::Corrupt { .. })));
    }
}
