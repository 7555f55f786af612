//! Key classifier
//!
//! Splits resolved keys into known and unknown against a type's schema,
//! lists required keys that are absent and checks values against schema
//! patterns. Nothing here blocks resolution or saving; findings are
//! returned as [`ValidationWarning`]s.

use preset_schema::{is_required, ConfigLocation, Schema, SchemaEntry};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::ValidationWarning;

/// Result of classifying one resolved map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub known: BTreeSet<String>,
    pub unknown: BTreeSet<String>,
    pub missing_required: BTreeSet<String>,
    pub warnings: Vec<ValidationWarning>,
}

/// Classify resolved `(key, value)` pairs for a preset stored at `location`.
pub fn classify<'a>(
    values: impl IntoIterator<Item = (&'a str, &'a Value)>,
    schema: &Schema,
    location: ConfigLocation,
) -> Classification {
    let mut result = Classification::default();
    let mut present = BTreeSet::new();

    for (key, value) in values {
        present.insert(key);
        match schema.get(key) {
            Some(entry) => {
                result.known.insert(key.to_string());
                if let Some(warning) = check_pattern(entry, value) {
                    result.warnings.push(warning);
                }
            }
            None => {
                result.unknown.insert(key.to_string());
            }
        }
    }

    for entry in schema.entries() {
        if is_required(location, entry) && !present.contains(entry.id) {
            result.missing_required.insert(entry.id.to_string());
            result.warnings.push(ValidationWarning::MissingRequired {
                key: entry.id.to_string(),
            });
        }
    }

    result
}

/// Check a value against the entry's pattern. Arrays are checked element
/// by element; non-string values are not checked.
fn check_pattern(entry: &SchemaEntry, value: &Value) -> Option<ValidationWarning> {
    let rule = entry.validation.as_ref()?;
    let mismatch = match value {
        Value::String(s) => !rule.matches(s),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .any(|s| !rule.matches(s)),
        _ => false,
    };

    mismatch.then(|| ValidationWarning::PatternMismatch {
        key: entry.id.to_string(),
        message: rule.message.to_string(),
        severity: rule.severity,
    })
}
