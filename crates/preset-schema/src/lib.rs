//! Static property schema for slicer presets.
//!
//! Every preset type (vendor manifest, printer model, printer, filament,
//! process) has an immutable table of property definitions. The tables are
//! built once on first use and shared by reference; nothing here performs
//! I/O or can fail at runtime.

mod entry;
mod kind;
mod tables;

pub use entry::{ReferenceCategory, SchemaEntry, Severity, ValidationRule};
pub use kind::{InputKind, ValueKind};
pub use tables::schema_for;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of preset a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigType {
    Vendor,
    PrinterModel,
    Printer,
    Filament,
    Process,
}

impl ConfigType {
    pub const ALL: [ConfigType; 5] = [
        ConfigType::Vendor,
        ConfigType::PrinterModel,
        ConfigType::Printer,
        ConfigType::Filament,
        ConfigType::Process,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigType::Vendor => "vendor",
            ConfigType::PrinterModel => "printer-model",
            ConfigType::Printer => "printer",
            ConfigType::Filament => "filament",
            ConfigType::Process => "process",
        }
    }

    /// Key of the vendor manifest list that enumerates presets of this type.
    pub fn vendor_list_key(&self) -> Option<&'static str> {
        match self {
            ConfigType::Vendor => None,
            ConfigType::PrinterModel => Some("machine_model_list"),
            ConfigType::Printer => Some("machine_list"),
            ConfigType::Filament => Some("filament_list"),
            ConfigType::Process => Some("process_list"),
        }
    }

    /// Subdirectory of the user tier holding presets of this type.
    ///
    /// Vendors and printer models only exist in the installed and system tiers.
    pub fn user_subdirectory(&self) -> Option<&'static str> {
        match self {
            ConfigType::Printer => Some("machine"),
            ConfigType::Filament => Some("filament"),
            ConfigType::Process => Some("process"),
            ConfigType::Vendor | ConfigType::PrinterModel => None,
        }
    }

    /// Human label used for export file names.
    pub fn export_label(&self) -> &'static str {
        match self {
            ConfigType::Vendor => "Vendor",
            ConfigType::PrinterModel => "Printer model",
            ConfigType::Printer => "Printer",
            ConfigType::Filament => "Filament",
            ConfigType::Process => "Process",
        }
    }

    /// Whether presets of this type can carry an `inherits` pointer.
    pub fn supports_inheritance(&self) -> bool {
        matches!(
            self,
            ConfigType::Printer | ConfigType::Filament | ConfigType::Process
        )
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vendor" => Ok(ConfigType::Vendor),
            "printer-model" | "machine_model" => Ok(ConfigType::PrinterModel),
            "printer" | "machine" => Ok(ConfigType::Printer),
            "filament" => Ok(ConfigType::Filament),
            "process" => Ok(ConfigType::Process),
            other => Err(UnknownVariant {
                what: "config type",
                value: other.to_string(),
            }),
        }
    }
}

/// Storage tier a preset lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLocation {
    /// Vendor-shipped profiles inside the slicer installation
    Installed,
    /// Snapshot of the vendor profiles bundled into the data directory
    System,
    /// User-authored presets
    User,
}

impl ConfigLocation {
    pub const ALL: [ConfigLocation; 3] = [
        ConfigLocation::Installed,
        ConfigLocation::System,
        ConfigLocation::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLocation::Installed => "installed",
            ConfigLocation::System => "system",
            ConfigLocation::User => "user",
        }
    }
}

impl fmt::Display for ConfigLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigLocation {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "installed" => Ok(ConfigLocation::Installed),
            "system" | "loaded_system" => Ok(ConfigLocation::System),
            "user" => Ok(ConfigLocation::User),
            other => Err(UnknownVariant {
                what: "config location",
                value: other.to_string(),
            }),
        }
    }
}

/// Error for unrecognized type/location names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: '{value}'")]
pub struct UnknownVariant {
    pub what: &'static str,
    pub value: String,
}

/// The property table of one preset type.
#[derive(Debug)]
pub struct Schema {
    config_type: ConfigType,
    entries: BTreeMap<&'static str, SchemaEntry>,
}

impl Schema {
    fn new(config_type: ConfigType, entries: Vec<SchemaEntry>) -> Self {
        let entries = entries.into_iter().map(|e| (e.id, e)).collect();
        Self {
            config_type,
            entries,
        }
    }

    pub fn config_type(&self) -> ConfigType {
        self.config_type
    }

    pub fn get(&self, id: &str) -> Option<&SchemaEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Entries in id order.
    pub fn entries(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether the entry holds a list of values rather than a single one.
pub fn is_vector(entry: &SchemaEntry) -> bool {
    entry.vector
}

/// The editor input that fits the entry's value kind.
pub fn input_kind_of(entry: &SchemaEntry) -> InputKind {
    entry.kind.input_kind()
}

/// Whether the entry must be present in a preset stored at `location`.
///
/// The system tier is a snapshot of installed profiles and shares their
/// requirement set.
pub fn is_required(location: ConfigLocation, entry: &SchemaEntry) -> bool {
    match location {
        ConfigLocation::Installed | ConfigLocation::System => entry.required_in_installed,
        ConfigLocation::User => entry.required_in_user,
    }
}
