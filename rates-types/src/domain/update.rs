//! Outcome of one refresh pass.

use chrono::NaiveDate;
use std::fmt;

use crate::error::{CycleFailure, NormalizationError, RecordError};

/// Why a feed entry did not make it into the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

/// A feed entry that was dropped while the rest of the document was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// 0-based index of the entry in the feed document, when it was
    /// rejected while reading the document
    pub position: Option<usize>,
    /// Raw code text, when the entry had one
    pub code: Option<String>,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.position, &self.code) {
            (Some(pos), Some(code)) => write!(f, "entry #{} ({}): {}", pos, code, self.reason),
            (Some(pos), None) => write!(f, "entry #{}: {}", pos, self.reason),
            (None, Some(code)) => write!(f, "{}: {}", code, self.reason),
            (None, None) => write!(f, "{}", self.reason),
        }
    }
}

/// Summary of a pass that reached the end of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub as_of: NaiveDate,
    pub written: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl UpdateReport {
    pub fn written_count(&self) -> usize {
        self.written
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Result of `UpdateCycle::run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    Succeeded(UpdateReport),
    Failed(CycleFailure),
}

impl UpdateResult {
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateResult::Succeeded(_))
    }

    pub fn report(&self) -> Option<&UpdateReport> {
        match self {
            UpdateResult::Succeeded(report) => Some(report),
            UpdateResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CycleFailure> {
        match self {
            UpdateResult::Succeeded(_) => None,
            UpdateResult::Failed(reason) => Some(reason),
        }
    }
}
