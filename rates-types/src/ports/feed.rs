//! Feed source port.
//!
//! Implementations can be HTTP clients, file readers, canned test documents, etc.

use crate::error::FetchError;

/// Port trait for retrieving the raw daily feed document.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync + 'static {
    /// Performs one retrieval and returns the undecoded document bytes.
    ///
    /// No internal retry: a failure is reported and the next scheduled
    /// cycle tries again.
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}
