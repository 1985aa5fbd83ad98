//! In-memory [`RecordStore`] implementation for tests and offline runs.
//!
//! Serves records in fixed-size pages behind a numeric cursor and applies
//! relation updates to its own copy of the records. Page fetches and
//! updates can be made to fail on demand.

use std::collections::HashSet;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;

use crate::models::{FieldValue, Record, RecordPage};
use crate::traits::RecordStore;

/// An update that was applied by [`InMemoryStore::update_relation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedUpdate {
    pub record_id: String,
    pub field: String,
    pub target_id: String,
}

/// In-memory store for tests.
pub struct InMemoryStore {
    records: RwLock<Vec<Record>>,
    page_size: usize,
    failing_pages: HashSet<u64>,
    failing_updates: HashSet<String>,
    applied: RwLock<Vec<AppliedUpdate>>,
}

impl InMemoryStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(records),
            page_size: 100,
            failing_pages: HashSet::new(),
            failing_updates: HashSet::new(),
            applied: RwLock::new(Vec::new()),
        }
    }

    /// Serve at most `size` records per page. Zero is treated as one.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Make the fetch of page `index` (0-based) fail.
    pub fn fail_page(mut self, index: u64) -> Self {
        self.failing_pages.insert(index);
        self
    }

    /// Make every update of `record_id` fail.
    pub fn fail_update(mut self, record_id: impl Into<String>) -> Self {
        self.failing_updates.insert(record_id.into());
        self
    }

    /// Updates applied so far, in call order.
    pub fn applied_updates(&self) -> Vec<AppliedUpdate> {
        self.applied
            .read()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    /// Current copy of a record, including applied updates.
    pub fn record(&self, id: &str) -> Option<Record> {
        self.records
            .read()
            .ok()
            .and_then(|records| records.iter().find(|r| r.id == id).cloned())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<RecordPage> {
        let page: u64 = match cursor {
            Some(c) => c
                .parse()
                .with_context(|| format!("invalid cursor '{}'", c))?,
            None => 0,
        };
        if self.failing_pages.contains(&page) {
            bail!("injected failure fetching page {}", page);
        }

        let records = self
            .records
            .read()
            .map_err(|_| anyhow!("record lock poisoned"))?;
        let start = (page as usize).saturating_mul(self.page_size);
        let end = start.saturating_add(self.page_size).min(records.len());
        let batch = records.get(start..end).map(<[Record]>::to_vec).unwrap_or_default();
        let next_cursor = (end < records.len()).then(|| (page + 1).to_string());

        Ok(RecordPage {
            records: batch,
            next_cursor,
        })
    }

    async fn update_relation(
        &self,
        record_id: &str,
        field_name: &str,
        target_id: &str,
    ) -> Result<()> {
        if self.failing_updates.contains(record_id) {
            bail!("injected failure updating {}", record_id);
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| anyhow!("record lock poisoned"))?;
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| anyhow!("record not found: {}", record_id))?;
        record.fields.insert(
            field_name.to_string(),
            FieldValue::Relation(vec![target_id.to_string()]),
        );

        self.applied
            .write()
            .map_err(|_| anyhow!("update log lock poisoned"))?
            .push(AppliedUpdate {
                record_id: record_id.to_string(),
                field: field_name.to_string(),
                target_id: target_id.to_string(),
            });
        Ok(())
    }
}
