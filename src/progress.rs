//! Run progress reporting.
//!
//! Emits observable progress while pages are retrieved and destination
//! records are linked, so long runs show how far along they are.
//! Progress is written to **stderr** so stdout stays parseable for scripts.

use std::io::Write;

use crate::models::OutcomeKind;

/// A single progress event.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkProgressEvent {
    /// A page was fetched; counts are cumulative.
    Retrieving {
        store: String,
        pages: u64,
        records: u64,
    },
    /// Destination `n` of `total` reached a terminal outcome.
    Linking {
        n: u64,
        total: u64,
        key: String,
        status: OutcomeKind,
    },
}

/// Receives progress events from the pipeline.
pub trait LinkProgressReporter: Send + Sync {
    fn report(&self, event: LinkProgressEvent);
}

/// Human-friendly progress on stderr: `link  [12/340]  'OAE-12'  linked`.
pub struct StderrProgress;

impl LinkProgressReporter for StderrProgress {
    fn report(&self, event: LinkProgressEvent) {
        let line = human_line(&event);
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl LinkProgressReporter for JsonProgress {
    fn report(&self, event: LinkProgressEvent) {
        if let Ok(line) = serde_json::to_string(&json_event(&event)) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

/// One line of human progress, newline included.
fn human_line(event: &LinkProgressEvent) -> String {
    match event {
        LinkProgressEvent::Retrieving {
            store,
            pages,
            records,
        } => format!(
            "retrieve {}  page {}  {} records\n",
            store,
            format_number(*pages),
            format_number(*records)
        ),
        LinkProgressEvent::Linking {
            n,
            total,
            key,
            status,
        } => {
            let shown = if key.is_empty() { "<no key>" } else { key };
            format!(
                "link  [{}/{}]  '{}'  {}\n",
                format_number(*n),
                format_number(*total),
                shown,
                status.as_str()
            )
        }
    }
}

fn json_event(event: &LinkProgressEvent) -> serde_json::Value {
    match event {
        LinkProgressEvent::Retrieving {
            store,
            pages,
            records,
        } => serde_json::json!({
            "event": "progress",
            "phase": "retrieving",
            "store": store,
            "pages": pages,
            "records": records
        }),
        LinkProgressEvent::Linking {
            n,
            total,
            key,
            status,
        } => serde_json::json!({
            "event": "progress",
            "phase": "linking",
            "n": n,
            "total": total,
            "key": key,
            "status": status.as_str()
        }),
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl LinkProgressReporter for NoProgress {
    fn report(&self, _event: LinkProgressEvent) {}
}

/// Format a count with thousands separators (`1234567` → `1,234,567`).
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse a CLI value. `auto` picks [`default_for_tty`](Self::default_for_tty).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(Self::default_for_tty()),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            "off" => Some(ProgressMode::Off),
            _ => None,
        }
    }

    pub fn reporter(&self) -> Box<dyn LinkProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Reporter that records every event, for assertions in other modules.
    #[derive(Default)]
    pub(crate) struct CollectingProgress {
        pub events: Mutex<Vec<LinkProgressEvent>>,
    }

    impl LinkProgressReporter for CollectingProgress {
        fn report(&self, event: LinkProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn parse_progress_modes() {
        assert_eq!(ProgressMode::parse("human"), Some(ProgressMode::Human));
        assert_eq!(ProgressMode::parse("json"), Some(ProgressMode::Json));
        assert_eq!(ProgressMode::parse("off"), Some(ProgressMode::Off));
        assert!(ProgressMode::parse("auto").is_some());
        assert_eq!(ProgressMode::parse("loud"), None);
    }

    #[test]
    fn human_lines() {
        let linked = LinkProgressEvent::Linking {
            n: 3,
            total: 1200,
            key: "OAE-1".to_string(),
            status: OutcomeKind::Linked,
        };
        assert_eq!(human_line(&linked), "link  [3/1,200]  'OAE-1'  linked\n");

        let absent = LinkProgressEvent::Linking {
            n: 4,
            total: 1200,
            key: String::new(),
            status: OutcomeKind::KeyAbsent,
        };
        assert!(human_line(&absent).contains("'<no key>'"));

        let page = LinkProgressEvent::Retrieving {
            store: "notion".to_string(),
            pages: 2,
            records: 1500,
        };
        assert_eq!(human_line(&page), "retrieve notion  page 2  1,500 records\n");
    }

    #[test]
    fn json_linking_event() {
        let v = json_event(&LinkProgressEvent::Linking {
            n: 1,
            total: 2,
            key: "K".to_string(),
            status: OutcomeKind::LinkFailed,
        });
        assert_eq!(v["event"], "progress");
        assert_eq!(v["phase"], "linking");
        assert_eq!(v["n"], 1);
        assert_eq!(v["key"], "K");
        assert_eq!(v["status"], OutcomeKind::LinkFailed.as_str());
    }
}
