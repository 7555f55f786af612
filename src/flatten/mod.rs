//! Flattening and export
//!
//! A flattened preset carries every resolved property and no `inherits`
//! pointer, so it loads on its own outside the vendor hierarchy. The name
//! gets a fresh UUID suffix so a re-imported copy never collides with its
//! source.

use preset_schema::ConfigType;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::PresetError;
use crate::merge::ResolvedConfig;
use crate::preset::{PresetIdentity, INHERITS_KEY, NAME_KEY};
use crate::resolver::{BatchItem, Resolver};
use crate::store::{ConfigStore, StoreError};

/// Version written when the resolved preset has none.
pub const DEFAULT_EXPORT_VERSION: &str = "1.2.3";

/// Keys that flattening rewrites regardless of the resolved values.
pub const IDENTITY_KEYS: &[&str] = &[
    NAME_KEY,
    "version",
    "from",
    "compatible_printers",
    "filament_settings_id",
    "print_settings_id",
];

/// A self-contained preset ready for packaging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlattenedPreset {
    /// The preset this was flattened from
    pub identity: PresetIdentity,
    pub properties: Map<String, Value>,
    pub suggested_file_name: String,
}

impl FlattenedPreset {
    /// The refreshed name.
    pub fn name(&self) -> &str {
        self.properties
            .get(NAME_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Replace a trailing `_<uuid>` with a fresh one, or append one.
pub fn refresh_name(name: &str) -> String {
    let base = match name.rsplit_once('_') {
        Some((base, suffix)) if Uuid::parse_str(suffix).is_ok() => base,
        _ => name,
    };
    format!("{}_{}", base, Uuid::new_v4())
}

/// Flatten an already resolved preset.
pub fn flatten_resolved(resolved: &ResolvedConfig) -> FlattenedPreset {
    let identity = resolved.leaf().clone();
    let config_type = identity.config_type();
    let mut properties = resolved.to_value_map();
    properties.remove(INHERITS_KEY);

    let current = properties
        .get(NAME_KEY)
        .and_then(Value::as_str)
        .unwrap_or_else(|| identity.name())
        .to_string();
    let name = refresh_name(&current);
    properties.insert(NAME_KEY.to_string(), Value::String(name.clone()));

    if !properties.get("version").is_some_and(is_truthy) {
        properties.insert(
            "version".to_string(),
            Value::String(DEFAULT_EXPORT_VERSION.to_string()),
        );
    }

    match config_type {
        ConfigType::Filament | ConfigType::Process => {
            properties.insert("compatible_printers".to_string(), Value::Array(Vec::new()));
        }
        ConfigType::Printer => {
            if let Some(list) = properties.get_mut("compatible_printers") {
                *list = Value::Array(Vec::new());
            }
        }
        ConfigType::Vendor | ConfigType::PrinterModel => {}
    }

    match config_type {
        ConfigType::Filament => {
            properties.insert("filament_settings_id".to_string(), Value::from(vec![name.clone()]));
        }
        ConfigType::Process => {
            properties.insert("print_settings_id".to_string(), Value::from(vec![name.clone()]));
        }
        _ => {}
    }

    properties.insert("from".to_string(), Value::String("User".to_string()));

    FlattenedPreset {
        suggested_file_name: format!("{} presets_{}.zip", config_type.export_label(), name),
        identity,
        properties,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Resolve and flatten one preset.
pub fn flatten(resolver: &Resolver, identity: &PresetIdentity) -> Result<FlattenedPreset, PresetError> {
    let resolved = resolver.resolve(identity)?;
    Ok(flatten_resolved(&resolved))
}

/// Flatten each identity independently.
pub fn flatten_batch(
    resolver: &Resolver,
    identities: &[PresetIdentity],
) -> Vec<BatchItem<FlattenedPreset>> {
    identities
        .iter()
        .map(|identity| {
            let outcome = flatten(resolver, identity);
            if let Err(e) = &outcome {
                warn!(preset = %identity, error = %e, "could not flatten preset");
            }
            BatchItem {
                identity: identity.clone(),
                outcome,
            }
        })
        .collect()
}

/// Receives flattened presets. Archiving happens behind this seam.
pub trait ExportSink {
    /// Store one preset and return where it went.
    fn export(&mut self, preset: &FlattenedPreset) -> Result<PathBuf, PresetError>;
}

/// Writes each preset as `<dir>/<name>.json`.
pub struct DirectorySink {
    store: Arc<dyn ConfigStore>,
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(store: Arc<dyn ConfigStore>, dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            dir: dir.into(),
        }
    }
}

impl ExportSink for DirectorySink {
    fn export(&mut self, preset: &FlattenedPreset) -> Result<PathBuf, PresetError> {
        let path = self.dir.join(format!("{}.json", preset.name()));
        self.store
            .write_config(&path, &preset.properties)
            .map_err(StoreError::into_write_error)?;
        info!(preset = %preset.identity, path = %path.display(), "exported preset");
        Ok(path)
    }
}

/// Flatten and export each identity; one failure never stops the rest.
pub fn export_batch(
    resolver: &Resolver,
    identities: &[PresetIdentity],
    sink: &mut dyn ExportSink,
) -> Vec<BatchItem<PathBuf>> {
    flatten_batch(resolver, identities)
        .into_iter()
        .map(|item| {
            let outcome = match item.outcome {
                Ok(preset) => sink.export(&preset).map_err(|e| {
                    warn!(preset = %item.identity, error = %e, "export failed");
                    e
                }),
                Err(e) => Err(e),
            };
            BatchItem {
                identity: item.identity,
                outcome,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_name_replaces_existing_uuid() {
        let once = refresh_name("My PLA");
        assert!(once.starts_with("My PLA_"));
        assert!(Uuid::parse_str(&once["My PLA_".len()..]).is_ok());

        let twice = refresh_name(&once);
        assert!(twice.starts_with("My PLA_"));
        assert_ne!(twice, once);
        assert_eq!(twice.matches('_').count(), 1);
    }

    #[test]
    fn test_refresh_name_keeps_other_suffixes() {
        let name = refresh_name("fdm_filament_pla");
        assert!(name.starts_with("fdm_filament_pla_"));
    }
}
