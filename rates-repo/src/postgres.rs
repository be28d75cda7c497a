//! PostgreSQL store adapter.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use rates_types::{CurrencyCode, Rate, RateStore, StoreEntry, StoreError};

use crate::keys::{
    AS_OF_KEY, RATE_PREFIX, code_from_key, decode_as_of, decode_rate, encode_as_of, encode_rate,
    rate_key,
};
use crate::types::{DbEntry, db_error};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Store
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL-backed rate store. One row per key, upserted independently.
pub struct PostgresStore {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

impl PostgresStore {
    /// Connects and applies the schema.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        execute_migration(
            &pool,
            include_str!("../migrations/0001_create_rate_cache_pg.sql"),
            "0001",
        )
        .await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO rate_cache (key, value, updated_at) VALUES ($1, $2, now())
               ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()"#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar::<_, String>(r#"SELECT value FROM rate_cache WHERE key = $1"#)
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
impl RateStore for PostgresStore {
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
            sqlx::query_scalar(r#"SELECT key FROM rate_cache WHERE starts_with(key, $1)"#)
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
        let rows: Vec<DbEntry> = sqlx::query_as(r#"SELECT key, value FROM rate_cache ORDER BY key"#)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(StoreEntry::from).collect())
    }
}
