//! Vendor manifest analysis
//!
//! Checks one vendor manifest for problems that would keep the slicer from
//! loading the family: a missing version, missing preset lists and list
//! entries whose files do not exist.

use preset_schema::{schema_for, ConfigLocation, ConfigType, Severity};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::classify::classify;
use crate::error::{PresetError, ValidationWarning};
use crate::locator::Locator;
use crate::preset::PresetIdentity;
use crate::store::StoreError;

/// Findings for one manifest, keyed by manifest property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorAnalysis {
    pub vendor: PresetIdentity,
    pub errors: BTreeMap<String, Vec<String>>,
    pub warnings: BTreeMap<String, Vec<String>>,
}

impl VendorAnalysis {
    fn new(vendor: PresetIdentity) -> Self {
        Self {
            vendor,
            errors: BTreeMap::new(),
            warnings: BTreeMap::new(),
        }
    }

    fn push(&mut self, severity: Severity, key: &str, message: String) {
        let target = match severity {
            Severity::Error => &mut self.errors,
            Severity::Warning => &mut self.warnings,
        };
        target.entry(key.to_string()).or_default().push(message);
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.values().map(Vec::len).sum()
    }
}

/// Analyse the manifest of `family` in `location`.
pub fn analyse_vendor(
    locator: &Locator,
    location: ConfigLocation,
    family: &str,
) -> Result<VendorAnalysis, PresetError> {
    let identity = locator.locate(ConfigType::Vendor, location, Some(family), family)?;
    let raw = locator
        .store()
        .read_config(identity.path())
        .map_err(StoreError::into_read_error)?;
    let (_, manifest) = locator.vendor_manifest(location, family)?;

    let mut analysis = VendorAnalysis::new(identity.clone());

    if manifest.version.as_deref().map_or(true, str::is_empty) {
        analysis.push(
            Severity::Error,
            "version",
            "Config must contain the key 'version'".to_string(),
        );
    }

    if let Value::Object(map) = &raw {
        let pairs = map.iter().map(|(k, v)| (k.as_str(), v));
        for warning in classify(pairs, schema_for(ConfigType::Vendor), location).warnings {
            if let ValidationWarning::PatternMismatch {
                key,
                message,
                severity,
            } = warning
            {
                analysis.push(severity, &key, message);
            }
        }
    }

    let family_dir = identity
        .path()
        .parent()
        .map(|parent| parent.join(family))
        .unwrap_or_else(|| family.into());

    for config_type in [
        ConfigType::PrinterModel,
        ConfigType::Printer,
        ConfigType::Filament,
        ConfigType::Process,
    ] {
        let Some(list_key) = config_type.vendor_list_key() else {
            continue;
        };
        let Some(entries) = manifest.list_for(config_type) else {
            analysis.push(
                Severity::Warning,
                list_key,
                format!("Config does not contain the key '{}'", list_key),
            );
            continue;
        };

        for entry in entries {
            let path = family_dir.join(&entry.sub_path);
            if !locator.store().exists(&path) {
                analysis.push(
                    Severity::Error,
                    list_key,
                    format!(
                        "'{}' points to '{}', which does not exist",
                        entry.name, entry.sub_path
                    ),
                );
            }
        }
    }

    debug!(
        vendor = %identity,
        errors = analysis.error_count(),
        warnings = analysis.warning_count(),
        "analysed vendor manifest"
    );
    Ok(analysis)
}
