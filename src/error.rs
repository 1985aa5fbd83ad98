//! Run-level errors.
//!
//! Per-record problems (duplicate keys, missing or unresolved keys, failed
//! updates) are recorded as outcomes and never surface here. A
//! [`ReconcileError`] means the run stopped before linking; it carries the
//! counts gathered up to that point so they can still be reported.

use serde::Serialize;
use thiserror::Error;

/// Counts gathered by the retrieval, classification and indexing phases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Records retrieved from the store.
    pub retrieved: usize,
    pub pages: u64,
    /// `false` when a page fetch failed and `retrieved` is a lower bound.
    pub retrieval_complete: bool,
    /// Records without the code field, excluded from reconciliation.
    pub skipped_without_code: usize,
    pub sources: usize,
    pub destinations: usize,
    /// Unique keys in the source index.
    pub indexed: usize,
    pub duplicate_keys: usize,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("retrieval stopped early ({failure}); refusing to link a partial collection")]
    PartialRetrieval { failure: String, summary: RunSummary },

    #[error("the store returned no records")]
    EmptyRetrieval { summary: RunSummary },

    #[error("no source records: no record has '{code_field}' without '{relation_field}'")]
    EmptySourceSet {
        code_field: String,
        relation_field: String,
        summary: RunSummary,
    },

    #[error("no destination records: no record has both '{code_field}' and '{relation_field}'")]
    EmptyDestinationSet {
        code_field: String,
        relation_field: String,
        summary: RunSummary,
    },

    #[error("source records exist but none has a usable '{code_field}' value")]
    EmptyIndex { code_field: String, summary: RunSummary },
}

impl ReconcileError {
    pub fn summary(&self) -> &RunSummary {
        match self {
            ReconcileError::PartialRetrieval { summary, .. }
            | ReconcileError::EmptyRetrieval { summary }
            | ReconcileError::EmptySourceSet { summary, .. }
            | ReconcileError::EmptyDestinationSet { summary, .. }
            | ReconcileError::EmptyIndex { summary, .. } => summary,
        }
    }

    /// Stable identifier used in JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            ReconcileError::PartialRetrieval { .. } => "partial_retrieval",
            ReconcileError::EmptyRetrieval { .. } => "empty_retrieval",
            ReconcileError::EmptySourceSet { .. } => "empty_source_set",
            ReconcileError::EmptyDestinationSet { .. } => "empty_destination_set",
            ReconcileError::EmptyIndex { .. } => "empty_index",
        }
    }
}
