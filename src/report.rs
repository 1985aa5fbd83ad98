//! Run reports.
//!
//! Renders a [`RunReport`] (or the summary carried by a [`ReconcileError`])
//! for the terminal or as JSON. Rendering only formats data; all counting
//! happens in the pipeline.

use anyhow::Result;
use serde_json::json;

use crate::error::{ReconcileError, RunSummary};
use crate::models::{Outcome, OutcomeKind};
use crate::progress::format_number;
use crate::reconcile::{RunMode, RunReport};

/// Render a completed run as text.
///
/// At most `preview` unresolved keys are listed; the rest are summarized.
pub fn render_text(report: &RunReport, preview: usize) -> String {
    let mut out = String::new();
    let title = match report.mode {
        RunMode::Link => "Relation Linker — Run Report",
        RunMode::DryRun => "Relation Linker — Dry Run",
        RunMode::Scan => "Relation Linker — Scan",
    };
    out.push_str(title);
    out.push('\n');
    out.push_str(&"=".repeat(title.chars().count()));
    out.push_str("\n\n");

    push_summary(&mut out, &report.summary);
    if let Some(failure) = &report.retrieval_failure {
        out.push_str(&format!("  Retrieval:   PARTIAL ({})\n", failure));
    }
    push_duplicates(&mut out, &report.duplicate_keys, preview);

    if let Some(links) = &report.links {
        let total = links.outcomes.len() as u64;
        let linked = links.linked() as u64;
        out.push('\n');
        out.push_str(&format!("  Processed:   {}\n", format_number(total)));
        out.push_str(&format!("  Linked:      {}\n", format_number(linked)));
        out.push_str(&format!(
            "  Failed:      {}\n",
            format_number(links.failed() as u64)
        ));
        out.push_str(&format!(
            "  No key:      {}\n",
            format_number(links.count(OutcomeKind::KeyAbsent) as u64)
        ));
        out.push_str(&format!(
            "  Unresolved:  {}\n",
            format_number(links.unresolved_keys.len() as u64)
        ));

        let failures: Vec<&Outcome> = links
            .outcomes
            .iter()
            .filter(|o| o.kind() == OutcomeKind::LinkFailed)
            .collect();
        if !failures.is_empty() {
            out.push_str("\n  Failed updates:\n");
            for o in failures.iter().take(preview) {
                if let Outcome::LinkFailed {
                    record_id,
                    key,
                    reason,
                    ..
                } = o
                {
                    out.push_str(&format!("    • {} ({}): {}\n", key, record_id, reason));
                }
            }
            push_more(&mut out, failures.len(), preview, "failures");
        }

        push_unresolved(&mut out, &links.unresolved_keys, preview);
        out.push('\n');
        out.push_str(&verdict(linked, total));
        out.push('\n');
    }

    if let Some(plan) = &report.plan {
        out.push('\n');
        out.push_str(&format!(
            "  Would link:  {}\n",
            format_number(plan.would_link.len() as u64)
        ));
        out.push_str(&format!("  No key:      {}\n", format_number(plan.key_absent as u64)));
        out.push_str(&format!(
            "  Unresolved:  {}\n",
            format_number(plan.unresolved_keys.len() as u64)
        ));
        push_unresolved(&mut out, &plan.unresolved_keys, preview);
    }

    out
}

/// Render a completed run as a single JSON document.
pub fn render_json(report: &RunReport) -> Result<String> {
    let value = json!({
        "status": "completed",
        "report": report,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Render an aborted run as text: the reason plus the counts gathered so far.
pub fn render_abort_text(err: &ReconcileError) -> String {
    let mut out = String::from("Relation Linker — Run Aborted\n=============================\n\n");
    out.push_str(&format!("  Reason:      {}\n\n", err));
    push_summary(&mut out, err.summary());
    out.push_str("\n  Linked:      0 (no updates were issued)\n");
    out
}

pub fn render_abort_json(err: &ReconcileError) -> Result<String> {
    let value = json!({
        "status": "aborted",
        "error": err.code(),
        "message": err.to_string(),
        "summary": err.summary(),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Final one-line verdict for a linking run.
pub fn verdict(linked: u64, total: u64) -> String {
    if total > 0 && linked == total {
        "All destination records were linked.".to_string()
    } else if linked > 0 {
        let pct = linked as f64 * 100.0 / total as f64;
        format!(
            "Partially linked: {:.1}% ({} of {})",
            pct,
            format_number(linked),
            format_number(total)
        )
    } else {
        "No records were linked.".to_string()
    }
}

fn push_summary(out: &mut String, s: &RunSummary) {
    out.push_str(&format!(
        "  Retrieved:   {} records in {} pages\n",
        format_number(s.retrieved as u64),
        format_number(s.pages)
    ));
    out.push_str(&format!(
        "  Skipped:     {} (no code field)\n",
        format_number(s.skipped_without_code as u64)
    ));
    out.push_str(&format!("  Sources:     {}\n", format_number(s.sources as u64)));
    out.push_str(&format!(
        "  Destinations: {}\n",
        format_number(s.destinations as u64)
    ));
    out.push_str(&format!("  Unique keys: {}\n", format_number(s.indexed as u64)));
    out.push_str(&format!(
        "  Duplicates:  {}\n",
        format_number(s.duplicate_keys as u64)
    ));
}

fn push_duplicates(out: &mut String, keys: &[String], preview: usize) {
    if keys.is_empty() {
        return;
    }
    out.push_str("\n  Duplicate keys (first record kept):\n");
    for k in keys.iter().take(preview) {
        out.push_str(&format!("    • {}\n", k));
    }
    push_more(out, keys.len(), preview, "keys");
}

fn push_unresolved(out: &mut String, keys: &[String], preview: usize) {
    if keys.is_empty() {
        return;
    }
    out.push_str(&format!(
        "\n  Keys not found among sources (first {}):\n",
        preview.min(keys.len())
    ));
    for k in keys.iter().take(preview) {
        out.push_str(&format!("    • {}\n", k));
    }
    push_more(out, keys.len(), preview, "keys");
}

fn push_more(out: &mut String, len: usize, preview: usize, noun: &str) {
    if len > preview {
        out.push_str(&format!("    ... and {} more {}\n", len - preview, noun));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::LinkReport;
    use chrono::Utc;

    fn report_with(outcomes: Vec<Outcome>, unresolved: Vec<String>) -> RunReport {
        RunReport {
            mode: RunMode::Link,
            summary: RunSummary {
                retrieved: 1500,
                pages: 15,
                retrieval_complete: true,
                skipped_without_code: 3,
                sources: 900,
                destinations: outcomes.len(),
                indexed: 899,
                duplicate_keys: 1,
            },
            retrieval_failure: None,
            duplicate_keys: vec!["A".to_string()],
            links: Some(LinkReport {
                outcomes,
                unresolved_keys: unresolved,
            }),
            plan: None,
            started_at: Utc::now(),
            duration_ms: 12,
        }
    }

    fn linked(id: &str) -> Outcome {
        Outcome::Linked {
            record_id: id.to_string(),
            key: id.to_string(),
            source_id: format!("s-{id}"),
        }
    }

    #[test]
    fn verdicts() {
        assert_eq!(verdict(3, 3), "All destination records were linked.");
        assert_eq!(verdict(2, 3), "Partially linked: 66.7% (2 of 3)");
        assert_eq!(verdict(0, 3), "No records were linked.");
        assert_eq!(verdict(0, 0), "No records were linked.");
    }

    #[test]
    fn text_report_lists_counts_and_truncates_unresolved() {
        let unresolved: Vec<String> = (0..25).map(|i| format!("K{i}")).collect();
        let mut outcomes = vec![linked("a"), linked("b")];
        outcomes.extend(unresolved.iter().map(|k| Outcome::KeyUnresolved {
            record_id: format!("r-{k}"),
            key: k.clone(),
        }));
        let text = render_text(&report_with(outcomes, unresolved), 20);

        assert!(text.contains("Retrieved:   1,500 records in 15 pages"));
        assert!(text.contains("Linked:      2"));
        assert!(text.contains("Unresolved:  25"));
        assert!(text.contains("• K19"));
        assert!(!text.contains("• K20"));
        assert!(text.contains("... and 5 more keys"));
        assert!(text.contains("Partially linked: 7.4% (2 of 27)"));
    }

    #[test]
    fn failures_are_listed_with_reason() {
        let outcomes = vec![
            linked("a"),
            Outcome::LinkFailed {
                record_id: "d9".to_string(),
                key: "Z9".to_string(),
                source_id: "s".to_string(),
                reason: "HTTP 409".to_string(),
            },
        ];
        let text = render_text(&report_with(outcomes, vec![]), 20);
        assert!(text.contains("Failed:      1"));
        assert!(text.contains("• Z9 (d9): HTTP 409"));
    }

    #[test]
    fn json_report_carries_outcomes() {
        let json = render_json(&report_with(vec![linked("a")], vec![])).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["status"], "completed");
        assert_eq!(v["report"]["summary"]["retrieved"], 1500);
        assert_eq!(v["report"]["links"]["outcomes"][0]["outcome"], "linked");
        assert_eq!(v["report"]["mode"], "link");
    }

    #[test]
    fn abort_reports_keep_counts() {
        let err = ReconcileError::EmptyIndex {
            code_field: "CODIGO".to_string(),
            summary: RunSummary {
                retrieved: 4,
                sources: 2,
                ..Default::default()
            },
        };
        let text = render_abort_text(&err);
        assert!(text.contains("usable 'CODIGO'"));
        assert!(text.contains("Retrieved:   4 records"));

        let v: serde_json::Value = serde_json::from_str(&render_abort_json(&err).unwrap()).unwrap();
        assert_eq!(v["status"], "aborted");
        assert_eq!(v["error"], "empty_index");
        assert_eq!(v["summary"]["sources"], 2);
    }
}
