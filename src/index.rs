//! Key index over source records.
//!
//! Built once per run from the source subset and read-only afterwards.
//! When several sources share a key, the first one seen keeps it and each
//! later one is reported as a duplicate.

use std::collections::HashMap;

use tracing::warn;

use crate::extract::extract_key;
use crate::models::Record;

/// Immutable key → source id mapping.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    entries: HashMap<String, String>,
}

impl KeyIndex {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for KeyIndex {
    /// First occurrence of a key wins, matching [`build_index`].
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut entries = HashMap::new();
        for (k, v) in iter {
            entries.entry(k).or_insert(v);
        }
        Self { entries }
    }
}

/// Index `sources` by the key in `code_field`.
///
/// Returns the index and the duplicate keys in the order the collisions were
/// seen. Records with an empty key or id are skipped silently.
pub fn build_index<'a, I>(sources: I, code_field: &str) -> (KeyIndex, Vec<String>)
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut entries: HashMap<String, String> = HashMap::new();
    let mut duplicates = Vec::new();

    for record in sources {
        let key = extract_key(record, code_field);
        if key.is_empty() || record.id.is_empty() {
            continue;
        }
        if entries.contains_key(&key) {
            warn!(key = %key, record_id = %record.id, "duplicate key in source records");
            duplicates.push(key);
        } else {
            entries.insert(key, record.id.clone());
        }
    }

    (KeyIndex { entries }, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, TextRun};

    fn src(id: &str, key: &str) -> Record {
        Record::new(id).with_field("CODIGO", FieldValue::Title(vec![TextRun::new(key)]))
    }

    #[test]
    fn first_write_wins_and_duplicates_are_reported() {
        let sources = vec![src("a1", "A"), src("b1", "B"), src("a2", "A"), src("c1", "C")];
        let (index, dups) = build_index(&sources, "CODIGO");

        assert_eq!(index.len(), 3);
        assert_eq!(index.get("A"), Some("a1"));
        assert_eq!(index.get("B"), Some("b1"));
        assert_eq!(index.get("C"), Some("c1"));
        assert_eq!(dups, vec!["A".to_string()]);
    }

    #[test]
    fn repeated_collisions_are_each_reported() {
        let sources = vec![src("a1", "A"), src("a2", "A"), src("a3", "A")];
        let (index, dups) = build_index(&sources, "CODIGO");
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("A"), Some("a1"));
        assert_eq!(dups, vec!["A".to_string(), "A".to_string()]);
    }

    #[test]
    fn empty_keys_are_neither_indexed_nor_duplicates() {
        let sources = vec![
            src("e1", "  "),
            Record::new("e2").with_field("CODIGO", FieldValue::Title(vec![])),
            src("e3", ""),
            src("", "NOID"),
        ];
        let (index, dups) = build_index(&sources, "CODIGO");
        assert!(index.is_empty());
        assert!(dups.is_empty());
    }

    #[test]
    fn numeric_keys_are_indexed_by_decimal_form() {
        let sources = vec![Record::new("n1").with_field("CODIGO", FieldValue::Number(Some(17.0)))];
        let (index, _) = build_index(&sources, "CODIGO");
        assert_eq!(index.get("17"), Some("n1"));
    }

    #[test]
    fn from_iter_keeps_first_entry() {
        let index: KeyIndex = vec![
            ("X".to_string(), "1".to_string()),
            ("X".to_string(), "2".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(index.get("X"), Some("1"));
        assert!(index.contains("X"));
        assert!(!index.contains("Y"));
    }
}
