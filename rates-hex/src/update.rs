//! Update cycle: the single writer path into the rate store.

use tracing::{debug, error, info, instrument, warn};

use rates_types::{
    FeedSource, ParsedFeed, RateStore, SkipReason, SkippedRecord, StoreError, UpdateReport,
    UpdateResult, normalize,
};

/// Runs one refresh pass against the feed and writes into the store.
///
/// Failure policy is fail-static: when the feed cannot be fetched or the
/// document cannot be parsed, the store is left exactly as it was and the
/// previous rates keep being served.
pub struct UpdateCycle<F: FeedSource, S: RateStore> {
    feed: F,
    store: S,
}

impl<F: FeedSource, S: RateStore> UpdateCycle<F, S> {
    pub fn new(feed: F, store: S) -> Self {
        Self { feed, store }
    }

    /// Executes one pass.
    ///
    /// Rates are written one key at a time, then the as-of marker. A reader
    /// running concurrently may see a mix of old and new rates.
    #[instrument(name = "update_cycle", skip(self), fields(cycle_id = %uuid::Uuid::new_v4()))]
    pub async fn run(&self) -> UpdateResult {
        info!("Updating currency rates");

        let bytes = match self.feed.fetch().await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Feed fetch failed, keeping cached rates: {}", e);
                return UpdateResult::Failed(e.into());
            }
        };

        let feed = match rates_feed::parse(&bytes) {
            Ok(feed) => feed,
            Err(e) => {
                error!("Feed parse failed, keeping cached rates: {}", e);
                return UpdateResult::Failed(e.into());
            }
        };

        match self.apply(feed).await {
            Ok(report) => {
                info!(
                    as_of = %report.as_of,
                    written = report.written_count(),
                    skipped = report.skipped_count(),
                    "Currency rates updated"
                );
                UpdateResult::Succeeded(report)
            }
            Err(e) => {
                error!("Store write failed, as-of marker not advanced: {}", e);
                UpdateResult::Failed(e.into())
            }
        }
    }

    async fn apply(&self, feed: ParsedFeed) -> Result<UpdateReport, StoreError> {
        let ParsedFeed {
            as_of,
            records,
            mut skipped,
        } = feed;
        let mut written = 0;

        for record in &records {
            match normalize(record) {
                Ok(rate) => {
                    self.store.set(&rate).await?;
                    debug!(code = %rate.code, value = %rate.per_unit_value, "rate stored");
                    written += 1;
                }
                Err(e) => {
                    warn!(code = %record.code, "Skipping record: {}", e);
                    skipped.push(SkippedRecord {
                        position: None,
                        code: Some(record.code.to_string()),
                        reason: SkipReason::Normalization(e),
                    });
                }
            }
        }

        // Only after every rate of this pass has been issued.
        self.store.set_as_of(as_of).await?;

        Ok(UpdateReport {
            as_of,
            written,
            skipped,
        })
    }
}
