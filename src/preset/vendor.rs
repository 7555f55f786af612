use preset_schema::ConfigType;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One entry of a vendor manifest list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNameAndPath {
    pub name: String,
    /// Path relative to the family directory
    pub sub_path: String,
}

/// Vendor manifest stored as `<root>/<family>.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VendorManifest {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub name: Option<String>,

    /// Carried through as text; numbers are accepted
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_model_list: Option<Vec<ConfigNameAndPath>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_list: Option<Vec<ConfigNameAndPath>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filament_list: Option<Vec<ConfigNameAndPath>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_list: Option<Vec<ConfigNameAndPath>>,

    /// Keys this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VendorManifest {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// The list enumerating presets of `config_type`, if present.
    pub fn list_for(&self, config_type: ConfigType) -> Option<&[ConfigNameAndPath]> {
        let list = match config_type {
            ConfigType::Vendor => return None,
            ConfigType::PrinterModel => &self.machine_model_list,
            ConfigType::Printer => &self.machine_list,
            ConfigType::Filament => &self.filament_list,
            ConfigType::Process => &self.process_list,
        };
        list.as_deref()
    }
}

/// Read any scalar as text. Arrays and objects count as absent.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manifest_lists_and_extra_keys() {
        let manifest = VendorManifest::from_value(json!({
            "name": "BBL",
            "version": "01.09.00.00",
            "force_update": "0",
            "machine_list": [{"name": "fdm_machine_common", "sub_path": "machine/fdm_machine_common.json"}],
            "filament_list": []
        }))
        .unwrap();

        assert_eq!(manifest.version.as_deref(), Some("01.09.00.00"));
        assert_eq!(manifest.list_for(ConfigType::Printer).unwrap().len(), 1);
        assert_eq!(manifest.list_for(ConfigType::Filament), Some(&[][..]));
        assert_eq!(manifest.list_for(ConfigType::Process), None);
        assert_eq!(manifest.extra["force_update"], "0");
    }

    #[test]
    fn test_numeric_name_and_version_are_text() {
        let manifest = VendorManifest::from_value(json!({
            "name": 3,
            "version": 2,
            "machine_list": []
        }))
        .unwrap();

        assert_eq!(manifest.name.as_deref(), Some("3"));
        assert_eq!(manifest.version.as_deref(), Some("2"));

        let manifest = VendorManifest::from_value(json!({"version": null})).unwrap();
        assert_eq!(manifest.version, None);
    }
}
