//! Extension trait for record stores.
//!
//! The reconciliation pipeline never talks HTTP directly. It reads pages and
//! writes relation updates through [`RecordStore`], which is implemented by
//! the Notion client ([`NotionStore`](crate::connector_notion::NotionStore))
//! and by the in-memory store used in tests and dry runs
//! ([`InMemoryStore`](crate::store_memory::InMemoryStore)).
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │              RecordStore              │
//! │  ┌──────────────┐  ┌───────────────┐  │
//! │  │ NotionStore  │  │ InMemoryStore │  │
//! │  │ (HTTP API)   │  │ (tests)       │  │
//! │  └──────────────┘  └───────────────┘  │
//! └──────────────────┬────────────────────┘
//!                    ▼
//!        run_reconciliation() → RunReport
//! ```

use anyhow::Result;
use async_trait::async_trait;

use crate::models::RecordPage;

/// A remote collection of records that can be listed page by page and
/// updated one record at a time.
///
/// # Example
///
/// ```rust
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use relation_linker::models::{Record, RecordPage};
/// use relation_linker::traits::RecordStore;
///
/// struct SinglePage(Vec<Record>);
///
/// #[async_trait]
/// impl RecordStore for SinglePage {
///     fn name(&self) -> &str { "single-page" }
///
///     async fn fetch_page(&self, _cursor: Option<&str>) -> Result<RecordPage> {
///         Ok(RecordPage { records: self.0.clone(), next_cursor: None })
///     }
///
///     async fn update_relation(&self, _id: &str, _field: &str, _target: &str) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short label used in logs and progress output.
    fn name(&self) -> &str;

    /// Fetch one page of records.
    ///
    /// `cursor` is `None` for the first page and otherwise the
    /// [`next_cursor`](RecordPage::next_cursor) of the previous page. A page
    /// with `next_cursor == None` is the last one.
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<RecordPage>;

    /// Replace the relation field `field_name` of `record_id` with a single
    /// reference to `target_id`.
    ///
    /// Performs exactly one remote mutation. Callers do not retry.
    async fn update_relation(&self, record_id: &str, field_name: &str, target_id: &str)
        -> Result<()>;
}
