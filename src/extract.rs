//! Key extraction from typed record fields.
//!
//! [`extract_key`] turns the value of a record's code field into the string
//! used for matching. It is total: any field it cannot read yields `""`,
//! which callers treat as "no usable key".
//!
//! | Encoding | Key |
//! |----------|-----|
//! | `title` | trimmed plain text of the first run |
//! | `rich_text` | trimmed plain text of the first run |
//! | `number` | decimal form (`42`, `3.5`) |
//! | anything else | `""` |

use crate::models::{FieldValue, Record, TextRun};

/// Extract the normalized key stored in `field_name` of `record`.
pub fn extract_key(record: &Record, field_name: &str) -> String {
    match record.fields.get(field_name) {
        Some(value) => key_from_value(value),
        None => String::new(),
    }
}

/// Extract a key from a single field value.
pub fn key_from_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Title(runs) | FieldValue::RichText(runs) => first_run_text(runs),
        FieldValue::Number(Some(n)) => format_number(*n),
        FieldValue::Number(None) | FieldValue::Relation(_) | FieldValue::Other(_) => String::new(),
    }
}

fn first_run_text(runs: &[TextRun]) -> String {
    runs.first()
        .map(|run| run.plain_text.trim().to_string())
        .unwrap_or_default()
}

/// Render a number in canonical decimal form.
///
/// `f64`'s `Display` already drops the fractional part of integral values
/// and never uses exponent notation, so `42.0` renders as `42`.
fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return String::new();
    }
    // -0.0 displays as "-0"
    if n == 0.0 {
        return "0".to_string();
    }
    n.to_string()
}
