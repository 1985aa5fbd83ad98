//! Core data models used throughout the linker.
//!
//! These types represent the records read from a store, the typed field
//! values they carry, and the per-record outcomes produced by a linking run.

use std::collections::HashMap;

use serde::Serialize;

/// One text run of a `title` or `rich_text` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub plain_text: String,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
        }
    }
}

/// A decoded field value.
///
/// Only [`Title`](FieldValue::Title), [`RichText`](FieldValue::RichText) and
/// [`Number`](FieldValue::Number) can carry a key. Relations are decoded so
/// the marker field is visible; every other encoding is kept as its type tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Title(Vec<TextRun>),
    RichText(Vec<TextRun>),
    Number(Option<f64>),
    Relation(Vec<String>),
    Other(String),
}

/// A record read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: HashMap<String, FieldValue>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: HashMap::new(),
        }
    }

    /// Builder-style helper used by stores and tests.
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// One page of records returned by a store, plus the cursor of the next page.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub next_cursor: Option<String>,
}

/// Terminal state of a single destination record after linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The relation field now points at `source_id`.
    Linked {
        record_id: String,
        key: String,
        source_id: String,
    },
    /// The update call failed; the record was left as it was.
    LinkFailed {
        record_id: String,
        key: String,
        source_id: String,
        reason: String,
    },
    /// The code field yielded no usable key.
    KeyAbsent { record_id: String },
    /// The key has no source record.
    KeyUnresolved { record_id: String, key: String },
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Linked { .. } => OutcomeKind::Linked,
            Outcome::LinkFailed { .. } => OutcomeKind::LinkFailed,
            Outcome::KeyAbsent { .. } => OutcomeKind::KeyAbsent,
            Outcome::KeyUnresolved { .. } => OutcomeKind::KeyUnresolved,
        }
    }

    pub fn record_id(&self) -> &str {
        match self {
            Outcome::Linked { record_id, .. }
            | Outcome::LinkFailed { record_id, .. }
            | Outcome::KeyAbsent { record_id }
            | Outcome::KeyUnresolved { record_id, .. } => record_id,
        }
    }
}

/// Tag of an [`Outcome`], used for counting and progress output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Linked,
    LinkFailed,
    KeyAbsent,
    KeyUnresolved,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Linked => "linked",
            OutcomeKind::LinkFailed => "link_failed",
            OutcomeKind::KeyAbsent => "key_absent",
            OutcomeKind::KeyUnresolved => "key_unresolved",
        }
    }
}
