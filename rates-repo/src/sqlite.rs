//! SQLite store adapter.
//!
//! Several processes may open the same database file; each key is an
//! independent row, so writers never block each other for longer than one
//! upsert.
#![allow(clippy::collapsible_if)]

use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use rates_types::{CurrencyCode, Rate, RateStore, StoreEntry, StoreError};

use crate::keys::{
    AS_OF_KEY, RATE_PREFIX, code_from_key, decode_as_of, decode_rate, encode_as_of, encode_rate,
    rate_key,
};
use crate::types::{DbEntry, db_error};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Store
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite-backed rate store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database and applies the schema.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if !in_memory {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to `:memory:` is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect_with(options)
            .await?;

        let ddl = include_str!("../migrations/0001_create_rate_cache.sql");
        sqlx::query(ddl).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO rate_cache (key, value, updated_at) VALUES (?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar::<_, String>(r#"SELECT value FROM rate_cache WHERE key = ?"#)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RateStore for SqliteStore {
    async fn set(&self, rate: &Rate) -> Result<(), StoreError> {
        self.put(&rate_key(&rate.code), &encode_rate(rate)).await
    }

    async fn get(&self, code: &CurrencyCode) -> Result<Option<Rate>, StoreError> {
        self.fetch(&rate_key(code))
            .await?
            .map(|v| decode_rate(code, &v))
            .transpose()
    }

    async fn list_codes(&self) -> Result<BTreeSet<CurrencyCode>, StoreError> {
        let keys: Vec<String> =
            sqlx::query_scalar(r#"SELECT key FROM rate_cache WHERE key LIKE ? || '%'"#)
                .bind(RATE_PREFIX)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(keys.iter().filter_map(|k| code_from_key(k)).collect())
    }

    async fn set_as_of(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.put(AS_OF_KEY, &encode_as_of(date)).await
    }

    async fn get_as_of(&self) -> Result<Option<NaiveDate>, StoreError> {
        self.fetch(AS_OF_KEY)
            .await?
            .map(|v| decode_as_of(&v))
            .transpose()
    }

    async fn entries(&self) -> Result<Vec<StoreEntry>, StoreError> {
        let rows: Vec<DbEntry> =
            sqlx::query_as(r#"SELECT key, value FROM rate_cache ORDER BY key"#)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(rows.into_iter().map(StoreEntry::from).collect())
    }
}
