//! Full-collection retrieval over a paginated store.
//!
//! [`fetch_all`] follows page cursors until the store reports the last page.
//! The first failed page stops the loop; whatever was accumulated is kept and
//! the result is marked partial so callers cannot mistake it for a complete
//! (or empty) collection. A store that hands back the cursor it was just
//! given would loop forever; that is treated as a failed page too.

use tracing::{debug, info, warn};

use crate::models::Record;
use crate::progress::{LinkProgressEvent, LinkProgressReporter};
use crate::traits::RecordStore;

/// Records gathered by [`fetch_all`].
#[derive(Debug, Default)]
pub struct Retrieval {
    pub records: Vec<Record>,
    /// Number of pages successfully fetched.
    pub pages: u64,
    /// Error message of the page fetch that stopped the loop, if any.
    pub failure: Option<String>,
}

impl Retrieval {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Fetch every page of `store`, one page at a time.
pub async fn fetch_all(
    store: &dyn RecordStore,
    progress: &dyn LinkProgressReporter,
) -> Retrieval {
    let mut out = Retrieval::default();
    let mut cursor: Option<String> = None;

    loop {
        let page = match store.fetch_page(cursor.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    store = store.name(),
                    pages = out.pages,
                    records = out.records.len(),
                    "page fetch failed, retrieval is partial: {:#}",
                    e
                );
                out.failure = Some(format!("{:#}", e));
                break;
            }
        };

        out.pages += 1;
        out.records.extend(page.records);
        debug!(page = out.pages, total = out.records.len(), "fetched page");
        progress.report(LinkProgressEvent::Retrieving {
            store: store.name().to_string(),
            pages: out.pages,
            records: out.records.len() as u64,
        });

        match page.next_cursor {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                warn!(
                    store = store.name(),
                    pages = out.pages,
                    cursor = %next,
                    "store repeated its cursor, retrieval is partial"
                );
                out.failure = Some(format!("store returned the same cursor '{}' twice", next));
                break;
            }
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    info!(
        store = store.name(),
        pages = out.pages,
        records = out.records.len(),
        complete = out.is_complete(),
        "retrieval finished"
    );
    out
}
