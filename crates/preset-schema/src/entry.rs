//! Schema entry definitions.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kind::ValueKind;

/// What a cross-referencing property points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceCategory {
    PrinterModel,
    Printer,
    Filament,
    Process,
    /// STL model file in the vendor directory
    StlFile,
    /// SVG texture file in the vendor directory
    SvgFile,
}

/// How serious a failed validation rule is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Pattern a string value must match.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pattern: Regex,
    pub message: &'static str,
    pub severity: Severity,
}

impl ValidationRule {
    pub fn new(pattern: &str, message: &'static str, severity: Severity) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            message,
            severity,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }
}

/// Definition of a single preset property.
#[derive(Debug, Clone)]
pub struct SchemaEntry {
    pub id: &'static str,
    pub kind: ValueKind,
    /// Holds a list of values (either a JSON array or a delimited string)
    pub vector: bool,
    pub required_in_installed: bool,
    pub required_in_user: bool,
    pub validation: Option<ValidationRule>,
    pub default: Value,
    /// Separator when the list is stored as one string, e.g. `"0.4;0.6"`
    pub delimiter: Option<&'static str>,
    pub reference: Option<ReferenceCategory>,
    /// Allowed values for `ValueKind::Enum`
    pub choices: &'static [&'static str],
}

impl SchemaEntry {
    pub(crate) fn scalar(id: &'static str, kind: ValueKind) -> Self {
        Self {
            id,
            kind,
            vector: false,
            required_in_installed: false,
            required_in_user: false,
            validation: None,
            default: Value::String(String::new()),
            delimiter: None,
            reference: None,
            choices: &[],
        }
    }

    pub(crate) fn vector(id: &'static str, kind: ValueKind) -> Self {
        Self {
            vector: true,
            default: Value::Array(Vec::new()),
            ..Self::scalar(id, kind)
        }
    }

    pub(crate) fn required(mut self, in_installed: bool, in_user: bool) -> Self {
        self.required_in_installed = in_installed;
        self.required_in_user = in_user;
        self
    }

    pub(crate) fn default_value(mut self, value: Value) -> Self {
        self.default = value;
        self
    }

    pub(crate) fn delimited(mut self, delimiter: &'static str) -> Self {
        self.delimiter = Some(delimiter);
        self.default = Value::String(String::new());
        self
    }

    pub(crate) fn references(mut self, category: ReferenceCategory) -> Self {
        self.reference = Some(category);
        self
    }

    pub(crate) fn choices(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }

    pub(crate) fn validated(mut self, rule: ValidationRule) -> Self {
        self.validation = Some(rule);
        self
    }

    /// Split a delimiter-joined list value into its elements.
    ///
    /// Entries without a delimiter yield the value itself.
    pub fn split_delimited<'a>(&self, value: &'a str) -> Vec<&'a str> {
        match self.delimiter {
            Some(d) if !value.is_empty() => value.split(d).collect(),
            Some(_) => Vec::new(),
            None => vec![value],
        }
    }

    /// Join list elements back into the stored delimited form.
    pub fn join_delimited(&self, values: &[&str]) -> String {
        values.join(self.delimiter.unwrap_or(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_join_delimited() {
        let entry = SchemaEntry::vector("default_materials", ValueKind::String).delimited(";");

        assert_eq!(entry.split_delimited("PLA;PETG"), vec!["PLA", "PETG"]);
        assert!(entry.split_delimited("").is_empty());
        assert_eq!(entry.join_delimited(&["PLA", "PETG"]), "PLA;PETG");
    }

    #[test]
    fn test_undelimited_split_is_identity() {
        let entry = SchemaEntry::scalar("name", ValueKind::String);
        assert_eq!(entry.split_delimited("a;b"), vec!["a;b"]);
    }

    #[test]
    fn test_validation_rule() {
        let rule = ValidationRule::new(r"^\d+$", "digits only", Severity::Warning).unwrap();
        assert!(rule.matches("123"));
        assert!(!rule.matches("12a"));
        assert_eq!(rule.pattern(), r"^\d+$");
    }
}
