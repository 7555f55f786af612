//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::chain::{DEFAULT_MAX_DEPTH, DEFAULT_SHARED_FILAMENT_FAMILY};

/// Built-in default settings values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Maximum links in one inheritance chain (default: 64)
    pub max_chain_depth: usize,

    /// Family searched for shared filament parents (default: "OrcaFilamentLibrary")
    pub shared_filament_family: String,

    /// Log filter used when RUST_LOG is unset (default: "info")
    pub log_filter: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            max_chain_depth: DEFAULT_MAX_DEPTH,
            shared_filament_family: DEFAULT_SHARED_FILAMENT_FAMILY.to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "log_filter": self.log_filter,
            "chain": {
                "max_depth": self.max_chain_depth,
                "shared_filament_family": self.shared_filament_family
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.max_chain_depth, 64);
        assert_eq!(defaults.shared_filament_family, "OrcaFilamentLibrary");
        assert_eq!(defaults.log_filter, "info");
    }

    #[test]
    fn test_to_value_nests_chain_settings() {
        let value = BuiltinDefaults::default().to_value();
        assert_eq!(value["chain"]["max_depth"], 64);
        assert_eq!(value["log_filter"], "info");
        assert!(value.get("data_dir").is_none());
    }
}
