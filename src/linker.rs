//! Destination linking.
//!
//! Resolves each destination record's key against the [`KeyIndex`] and, when
//! a source is found, issues exactly one relation update through the
//! [`RecordStore`]. Per-record problems never stop the batch: every
//! destination ends in one of the four [`Outcome`]s.
//!
//! ```text
//! start ──▶ key empty?      ──▶ KeyAbsent
//!       ──▶ key not indexed? ──▶ KeyUnresolved
//!       ──▶ update ok?       ──▶ Linked
//!       ──▶ update err       ──▶ LinkFailed
//! ```
//!
//! Failed updates are not retried within a run.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::extract::extract_key;
use crate::index::KeyIndex;
use crate::models::{Outcome, OutcomeKind, Record};
use crate::progress::{LinkProgressEvent, LinkProgressReporter};
use crate::traits::RecordStore;

/// Field names used while linking.
#[derive(Debug, Clone, Copy)]
pub struct LinkFields<'a> {
    /// Field holding the business key.
    pub code: &'a str,
    /// Relation field written on destination records.
    pub relation: &'a str,
}

/// Outcomes of [`link_all`], one per destination in input order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LinkReport {
    pub outcomes: Vec<Outcome>,
    /// Keys that had no source, in the order they were met.
    pub unresolved_keys: Vec<String>,
}

impl LinkReport {
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind() == kind).count()
    }

    pub fn linked(&self) -> usize {
        self.count(OutcomeKind::Linked)
    }

    pub fn failed(&self) -> usize {
        self.count(OutcomeKind::LinkFailed)
    }
}

/// How a destination's key resolved, before any update is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'i> {
    Absent,
    Unresolved(String),
    Resolved { key: String, source_id: &'i str },
}

/// Resolve the key of `record` against `index`.
pub fn resolve<'i>(record: &Record, index: &'i KeyIndex, code_field: &str) -> Resolution<'i> {
    let key = extract_key(record, code_field);
    if key.is_empty() {
        return Resolution::Absent;
    }
    match index.get(&key) {
        Some(source_id) => Resolution::Resolved { key, source_id },
        None => Resolution::Unresolved(key),
    }
}

/// Link every destination record, sequentially.
pub async fn link_all(
    destinations: &[&Record],
    index: &KeyIndex,
    fields: LinkFields<'_>,
    store: &dyn RecordStore,
    progress: &dyn LinkProgressReporter,
) -> LinkReport {
    let total = destinations.len() as u64;
    let mut report = LinkReport {
        outcomes: Vec::with_capacity(destinations.len()),
        unresolved_keys: Vec::new(),
    };

    for (i, record) in destinations.iter().enumerate() {
        let outcome = match resolve(record, index, fields.code) {
            Resolution::Absent => {
                debug!(record_id = %record.id, "destination has no key");
                Outcome::KeyAbsent {
                    record_id: record.id.clone(),
                }
            }
            Resolution::Unresolved(key) => {
                warn!(record_id = %record.id, key = %key, "key not found in source records");
                report.unresolved_keys.push(key.clone());
                Outcome::KeyUnresolved {
                    record_id: record.id.clone(),
                    key,
                }
            }
            Resolution::Resolved { key, source_id } => {
                match store
                    .update_relation(&record.id, fields.relation, source_id)
                    .await
                {
                    Ok(()) => {
                        debug!(record_id = %record.id, key = %key, source_id, "linked");
                        Outcome::Linked {
                            record_id: record.id.clone(),
                            key,
                            source_id: source_id.to_string(),
                        }
                    }
                    Err(e) => {
                        let reason = format!("{:#}", e);
                        warn!(
                            record_id = %record.id,
                            key = %key,
                            source_id,
                            "link update failed: {}",
                            reason
                        );
                        Outcome::LinkFailed {
                            record_id: record.id.clone(),
                            key,
                            source_id: source_id.to_string(),
                            reason,
                        }
                    }
                }
            }
        };

        progress.report(LinkProgressEvent::Linking {
            n: i as u64 + 1,
            total,
            key: outcome_key(&outcome).to_string(),
            status: outcome.kind(),
        });
        report.outcomes.push(outcome);
    }

    info!(
        total = destinations.len(),
        linked = report.linked(),
        failed = report.failed(),
        key_absent = report.count(OutcomeKind::KeyAbsent),
        unresolved = report.unresolved_keys.len(),
        "linking finished"
    );
    report
}

/// What [`link_all`] would do, without issuing any update.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DryRunPlan {
    /// `(destination id, source id)` pairs that would be linked.
    pub would_link: Vec<(String, String)>,
    pub key_absent: usize,
    pub unresolved_keys: Vec<String>,
}

pub fn plan_links(destinations: &[&Record], index: &KeyIndex, code_field: &str) -> DryRunPlan {
    let mut plan = DryRunPlan::default();
    for record in destinations {
        match resolve(record, index, code_field) {
            Resolution::Absent => plan.key_absent += 1,
            Resolution::Unresolved(key) => plan.unresolved_keys.push(key),
            Resolution::Resolved { source_id, .. } => plan
                .would_link
                .push((record.id.clone(), source_id.to_string())),
        }
    }
    plan
}

fn outcome_key(outcome: &Outcome) -> &str {
    match outcome {
        Outcome::Linked { key, .. }
        | Outcome::LinkFailed { key, .. }
        | Outcome::KeyUnresolved { key, .. } => key,
        Outcome::KeyAbsent { .. } => "",
    }
}
