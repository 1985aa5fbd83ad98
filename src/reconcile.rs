//! Reconciliation pipeline orchestration.
//!
//! Coordinates the full run: retrieval → classification → key index →
//! linking. Run-level preconditions (complete retrieval, non-empty source,
//! destination and index sets) are checked before any update is issued;
//! everything after that point is per-record and non-fatal.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::classify::classify;
use crate::error::{ReconcileError, RunSummary};
use crate::index::build_index;
use crate::linker::{link_all, plan_links, DryRunPlan, LinkFields, LinkReport};
use crate::progress::LinkProgressReporter;
use crate::retrieve::fetch_all;
use crate::traits::RecordStore;

/// What a run does after indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Issue relation updates.
    Link,
    /// Resolve keys but issue no updates.
    DryRun,
    /// Stop after indexing. Preconditions are reported, not enforced.
    Scan,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub code_field: String,
    pub relation_field: String,
    /// Proceed even if a page fetch failed.
    pub allow_partial: bool,
    pub mode: RunMode,
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub summary: RunSummary,
    /// Error of the page fetch that cut retrieval short, if any.
    pub retrieval_failure: Option<String>,
    pub duplicate_keys: Vec<String>,
    /// Set in [`RunMode::Link`].
    pub links: Option<LinkReport>,
    /// Set in [`RunMode::DryRun`].
    pub plan: Option<DryRunPlan>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Run one reconciliation against `store`.
pub async fn run_reconciliation(
    store: &dyn RecordStore,
    options: &RunOptions,
    progress: &dyn LinkProgressReporter,
) -> Result<RunReport, ReconcileError> {
    let started_at = Utc::now();
    info!(
        store = store.name(),
        code_field = %options.code_field,
        relation_field = %options.relation_field,
        mode = ?options.mode,
        "starting reconciliation"
    );

    let retrieval = fetch_all(store, progress).await;
    let classes = classify(
        &retrieval.records,
        &options.code_field,
        &options.relation_field,
    );
    let (index, duplicate_keys) = build_index(classes.sources.iter().copied(), &options.code_field);

    let summary = RunSummary {
        retrieved: retrieval.records.len(),
        pages: retrieval.pages,
        retrieval_complete: retrieval.is_complete(),
        skipped_without_code: classes.skipped,
        sources: classes.sources.len(),
        destinations: classes.destinations.len(),
        indexed: index.len(),
        duplicate_keys: duplicate_keys.len(),
    };
    info!(
        sources = summary.sources,
        destinations = summary.destinations,
        skipped_without_code = summary.skipped_without_code,
        indexed = summary.indexed,
        duplicates = summary.duplicate_keys,
        "classified records"
    );
    if summary.skipped_without_code > 0 {
        warn!(
            count = summary.skipped_without_code,
            field = %options.code_field,
            "records without the code field were left out"
        );
    }

    let finish = |links: Option<LinkReport>, plan: Option<DryRunPlan>, summary: RunSummary| {
        RunReport {
            mode: options.mode,
            summary,
            retrieval_failure: retrieval.failure.clone(),
            duplicate_keys: duplicate_keys.clone(),
            links,
            plan,
            started_at,
            duration_ms: (Utc::now() - started_at).num_milliseconds(),
        }
    };

    if options.mode == RunMode::Scan {
        return Ok(finish(None, None, summary));
    }

    check_preconditions(&retrieval.failure, &summary, options)?;

    match options.mode {
        RunMode::DryRun => {
            let plan = plan_links(&classes.destinations, &index, &options.code_field);
            info!(
                would_link = plan.would_link.len(),
                unresolved = plan.unresolved_keys.len(),
                "dry run planned"
            );
            Ok(finish(None, Some(plan), summary))
        }
        _ => {
            let fields = LinkFields {
                code: &options.code_field,
                relation: &options.relation_field,
            };
            let links = link_all(&classes.destinations, &index, fields, store, progress).await;
            Ok(finish(Some(links), None, summary))
        }
    }
}

fn check_preconditions(
    failure: &Option<String>,
    summary: &RunSummary,
    options: &RunOptions,
) -> Result<(), ReconcileError> {
    if let Some(failure) = failure {
        if !options.allow_partial || summary.retrieved == 0 {
            return Err(ReconcileError::PartialRetrieval {
                failure: failure.clone(),
                summary: summary.clone(),
            });
        }
        warn!("continuing with a partial retrieval: {}", failure);
    }
    if summary.retrieved == 0 {
        return Err(ReconcileError::EmptyRetrieval {
            summary: summary.clone(),
        });
    }
    if summary.sources == 0 {
        return Err(ReconcileError::EmptySourceSet {
            code_field: options.code_field.clone(),
            relation_field: options.relation_field.clone(),
            summary: summary.clone(),
        });
    }
    if summary.destinations == 0 {
        return Err(ReconcileError::EmptyDestinationSet {
            code_field: options.code_field.clone(),
            relation_field: options.relation_field.clone(),
            summary: summary.clone(),
        });
    }
    if summary.indexed == 0 {
        return Err(ReconcileError::EmptyIndex {
            code_field: options.code_field.clone(),
            summary: summary.clone(),
        });
    }
    Ok(())
}
