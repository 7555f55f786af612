//! Error taxonomy and non-blocking validation warnings

use std::fmt;
use std::path::PathBuf;

use preset_schema::{ConfigLocation, ConfigType, Severity};
use serde::Serialize;

/// Failures of locating, resolving, flattening or writing a single preset.
///
/// Every variant is an ordinary value: batch operations collect them per
/// item and keep going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresetError {
    #[error("{config_type} preset '{name}' not found in the {location} tier")]
    NotFound {
        config_type: ConfigType,
        location: ConfigLocation,
        family: Option<String>,
        name: String,
    },

    #[error("preset '{child}' inherits from '{parent}', which could not be located")]
    MissingParent { child: String, parent: String },

    #[error("inheritance cycle at '{name}' after {depth} level(s)")]
    Cycle { name: String, depth: usize },

    #[error("malformed preset {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("could not read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("could not write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("{config_type} presets do not exist in the {location} tier")]
    Unsupported {
        config_type: ConfigType,
        location: ConfigLocation,
    },
}

impl PresetError {
    /// Short machine-readable tag, e.g. `MISSING_PARENT`
    pub fn code(&self) -> &'static str {
        match self {
            PresetError::NotFound { .. } => "NOT_FOUND",
            PresetError::MissingParent { .. } => "MISSING_PARENT",
            PresetError::Cycle { .. } => "CYCLE",
            PresetError::Parse { .. } => "PARSE",
            PresetError::Read { .. } => "READ",
            PresetError::Write { .. } => "WRITE",
            PresetError::Unsupported { .. } => "UNSUPPORTED",
        }
    }
}

/// A problem worth showing to the user that never blocks resolution or saving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// A key required for the preset's tier is absent from the resolved map
    MissingRequired { key: String },

    /// A string value does not match its schema pattern
    PatternMismatch {
        key: String,
        message: String,
        severity: Severity,
    },

    /// An ancestor was only found in the installation, not in the loaded snapshot
    AncestorOutsideLoadedTier { name: String },
}

impl ValidationWarning {
    pub fn key(&self) -> &str {
        match self {
            ValidationWarning::MissingRequired { key } => key,
            ValidationWarning::PatternMismatch { key, .. } => key,
            ValidationWarning::AncestorOutsideLoadedTier { .. } => "inherits",
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::MissingRequired { key } => {
                write!(f, "required key '{}' is missing", key)
            }
            ValidationWarning::PatternMismatch { key, message, .. } => {
                write!(f, "{}: {}", key, message)
            }
            ValidationWarning::AncestorOutsideLoadedTier { name } => write!(
                f,
                "ancestor '{}' was only found in the installation; the slicer may not load this preset",
                name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_preset() {
        let err = PresetError::MissingParent {
            child: "LeafX".to_string(),
            parent: "Ghost".to_string(),
        };
        assert_eq!(err.code(), "MISSING_PARENT");
        assert!(err.to_string().contains("Ghost"));

        let err = PresetError::NotFound {
            config_type: ConfigType::Filament,
            location: ConfigLocation::User,
            family: None,
            name: "Generic PLA".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "filament preset 'Generic PLA' not found in the user tier"
        );
    }

    #[test]
    fn test_warning_serializes_with_tag() {
        let warning = ValidationWarning::MissingRequired {
            key: "printer_variant".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();

        assert_eq!(json["type"], "missing_required");
        assert_eq!(json["key"], "printer_variant");
        assert_eq!(warning.key(), "printer_variant");
    }
}
