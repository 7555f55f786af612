use preset_schema::{ConfigLocation, ConfigType};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Immutable address of one stored preset.
///
/// Only the locator creates identities, so holding one means the record
/// was found at `path` when it was located.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PresetIdentity {
    config_type: ConfigType,
    location: ConfigLocation,
    family: Option<String>,
    name: String,
    path: PathBuf,
}

impl PresetIdentity {
    pub(crate) fn new(
        config_type: ConfigType,
        location: ConfigLocation,
        family: Option<String>,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config_type,
            location,
            family,
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn config_type(&self) -> ConfigType {
        self.config_type
    }

    pub fn location(&self) -> ConfigLocation {
        self.location
    }

    /// Vendor family, `None` for user presets.
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for PresetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.family {
            Some(family) => write!(
                f,
                "{} {}:{}/{}",
                self.config_type, self.location, family, self.name
            ),
            None => write!(f, "{} {}:{}", self.config_type, self.location, self.name),
        }
    }
}
