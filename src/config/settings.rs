//! Effective settings with provenance
//!
//! Captures the merged settings plus where each layer came from, so a
//! surprising value can be traced back to the file that set it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::chain::ChainOptions;
use crate::locator::StorageRoots;

/// Upper bound accepted for `chain.max_depth`
pub const MAX_CHAIN_DEPTH_LIMIT: usize = 1024;

/// Origin of a settings layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettingsOrigin {
    Builtin,
    User,
    Cli,
}

/// A contributing settings layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettingsSource {
    pub origin: SettingsOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    installation_dir: Option<PathBuf>,
    #[serde(default)]
    data_dir: Option<PathBuf>,
    log_filter: String,
    chain: RawChainSettings,
}

#[derive(Debug, Deserialize)]
struct RawChainSettings {
    max_depth: usize,
    #[serde(default)]
    shared_filament_family: Option<String>,
}

/// Resolved tool settings
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Slicer installation (holds the installed vendor profiles)
    pub installation_dir: Option<PathBuf>,

    /// Slicer data directory (holds the system snapshot and user presets)
    pub data_dir: Option<PathBuf>,

    pub log_filter: String,

    pub max_chain_depth: usize,

    pub shared_filament_family: Option<String>,

    /// The merged settings object
    pub config: Value,

    /// Contributing layers in precedence order
    pub sources: Vec<SettingsSource>,
}

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// `~/.config/slicer-presets/config.toml`, if HOME is set
pub fn default_settings_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("slicer-presets")
            .join("config.toml")
    })
}

/// Where an installation keeps its vendor profiles.
pub fn installed_profiles_dir(installation_dir: &Path) -> PathBuf {
    if cfg!(target_os = "macos") {
        installation_dir
            .join("Contents")
            .join("Resources")
            .join("profiles")
    } else {
        installation_dir.join("resources").join("profiles")
    }
}

impl Settings {
    /// Build settings from layers. A settings path that does not exist is skipped.
    pub fn build(
        user_settings_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, SettingsError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        layers.push(BuiltinDefaults::default().to_value());
        sources.push(SettingsSource {
            origin: SettingsOrigin::Builtin,
            path: None,
            digest: None,
        });

        // Layer 2: User settings file
        if let Some(path) = user_settings_path {
            if path.exists() {
                let (value, digest) = load_toml_file(path)?;
                layers.push(value);
                sources.push(SettingsSource {
                    origin: SettingsOrigin::User,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        // Layer 3: CLI overrides
        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(SettingsSource {
                origin: SettingsOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        validate(&merged)?;

        let raw: RawSettings = serde_json::from_value(merged.clone())
            .map_err(|e| SettingsError::Validation(e.to_string()))?;

        Ok(Self {
            installation_dir: raw.installation_dir,
            data_dir: raw.data_dir,
            log_filter: raw.log_filter,
            max_chain_depth: raw.chain.max_depth,
            shared_filament_family: raw.chain.shared_filament_family.filter(|f| !f.is_empty()),
            config: merged,
            sources,
        })
    }

    /// Root directories of the three storage tiers.
    pub fn storage_roots(&self) -> StorageRoots {
        StorageRoots {
            installed: self.installation_dir.as_deref().map(installed_profiles_dir),
            system: self.data_dir.as_ref().map(|d| d.join("system")),
            user: self
                .data_dir
                .as_ref()
                .map(|d| d.join("user").join("default")),
        }
    }

    pub fn chain_options(&self) -> ChainOptions {
        ChainOptions {
            max_depth: self.max_chain_depth,
            shared_filament_family: self.shared_filament_family.clone(),
        }
    }

    /// Get a merged value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Load and parse a TOML file, returning the value and digest
fn load_toml_file(path: &Path) -> Result<(Value, String), SettingsError> {
    let bytes = fs::read(path).map_err(|e| SettingsError::Io(format!("{}: {}", path.display(), e)))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes)
        .map_err(|e| SettingsError::Parse(format!("Invalid UTF-8: {}", e)))?;

    let toml_value: toml::Value = toml::from_str(&contents)
        .map_err(|e| SettingsError::Parse(format!("TOML parse error: {}", e)))?;

    Ok((toml_to_json(toml_value), digest))
}

/// Convert TOML Value to JSON Value
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn validate(config: &Value) -> Result<(), SettingsError> {
    // chain.max_depth must be in [1, MAX_CHAIN_DEPTH_LIMIT]
    let depth = config.get("chain").and_then(|c| c.get("max_depth"));
    match depth.and_then(Value::as_u64) {
        Some(d) if (1..=MAX_CHAIN_DEPTH_LIMIT as u64).contains(&d) => {}
        _ => {
            return Err(SettingsError::Validation(format!(
                "chain.max_depth must be an integer in [1, {}]",
                MAX_CHAIN_DEPTH_LIMIT
            )))
        }
    }

    for key in ["installation_dir", "data_dir"] {
        match config.get(key) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(_) => {
                return Err(SettingsError::Validation(format!(
                    "{} must be a path string",
                    key
                )))
            }
        }
    }

    Ok(())
}
