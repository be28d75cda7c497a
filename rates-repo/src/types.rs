//! Shared database row types for SQLite and PostgreSQL.

use sqlx::FromRow;

use rates_types::StoreEntry;

/// One row of the `rate_cache` table.
#[derive(FromRow)]
pub struct DbEntry {
    pub key: String,
    pub value: String,
}

impl From<DbEntry> for StoreEntry {
    fn from(row: DbEntry) -> Self {
        StoreEntry::new(row.key, row.value)
    }
}

pub fn db_error(err: sqlx::Error) -> rates_types::StoreError {
    rates_types::StoreError::Backend(err.to_string())
}
