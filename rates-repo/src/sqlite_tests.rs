//! SQLite store integration tests.

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use rates_types::{CurrencyCode, Rate, RateStore};

    use crate::{SqliteStore, Store, build_store, store_tests};

    async fn setup_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    fn rate(c: &str, v: &str) -> Rate {
        Rate::new(CurrencyCode::new(c).unwrap(), v.parse::<Decimal>().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_cold_store() {
        store_tests::cold_store_is_empty(&setup_store().await).await;
    }

    #[tokio::test]
    async fn test_round_trip() {
        store_tests::rates_round_trip(&setup_store().await).await;
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        store_tests::last_write_wins_per_key(&setup_store().await).await;
    }

    #[tokio::test]
    async fn test_as_of_marker() {
        store_tests::as_of_marker_overwrites(&setup_store().await).await;
    }

    #[tokio::test]
    async fn test_entries_dump() {
        store_tests::entries_are_verbatim(&setup_store().await).await;
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let store = setup_store().await;
        sqlx::query("INSERT INTO rate_cache (key, value, updated_at) VALUES ('currency:USD', 'oops', '')")
            .execute(store.pool())
            .await
            .unwrap();

        let usd = CurrencyCode::new("USD").unwrap();
        assert!(matches!(
            store.get(&usd).await,
            Err(rates_types::StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_two_handles_share_one_file() {
        // Two handles on one file stand in for two processes.
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("rates.db").display());

        let writer = build_store(&url).await.unwrap();
        let reader = build_store(&url).await.unwrap();
        assert!(matches!(writer, Store::Sqlite(_)));

        writer.set(&rate("USD", "73.5")).await.unwrap();
        writer
            .set_as_of(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
            .await
            .unwrap();

        let usd = CurrencyCode::new("USD").unwrap();
        assert_eq!(reader.get(&usd).await.unwrap(), Some(rate("USD", "73.5")));
        assert_eq!(
            reader.get_as_of().await.unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10)
        );

        // Last write wins regardless of which handle wrote.
        reader.set(&rate("USD", "74")).await.unwrap();
        assert_eq!(writer.get(&usd).await.unwrap(), Some(rate("USD", "74")));
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");
        let url = format!("sqlite://{}", path.display());

        let store = SqliteStore::new(&url).await.unwrap();
        store.set(&rate("EUR", "80.1")).await.unwrap();

        assert!(path.exists());
    }
}
