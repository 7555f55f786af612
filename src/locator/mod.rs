//! Config locator
//!
//! Maps (type, tier, family, name) to a [`PresetIdentity`] across the three
//! storage tiers:
//!
//! - installed and system: `<root>/<family>.json` vendor manifests whose
//!   lists point at `<root>/<family>/<sub_path>` files
//! - user: `<root>/{machine,filament,process}/*.json`, plus a `base/`
//!   subdirectory under each
//!
//! When several records match one lookup, the candidate from the requested
//! family wins; otherwise the lexicographically first identity is used.

use preset_schema::{ConfigLocation, ConfigType};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::PresetError;
use crate::preset::{PresetIdentity, PresetRecord, VendorManifest};
use crate::store::{json_entries, ConfigStore, StoreError};

/// Subdirectory of each user type directory that holds base presets.
pub const USER_BASE_DIR: &str = "base";

/// Root directory of each storage tier. A missing root is an empty tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageRoots {
    pub installed: Option<PathBuf>,
    pub system: Option<PathBuf>,
    pub user: Option<PathBuf>,
}

impl StorageRoots {
    pub fn root(&self, location: ConfigLocation) -> Option<&Path> {
        match location {
            ConfigLocation::Installed => self.installed.as_deref(),
            ConfigLocation::System => self.system.as_deref(),
            ConfigLocation::User => self.user.as_deref(),
        }
    }
}

/// Finds stored presets through a [`ConfigStore`].
#[derive(Clone)]
pub struct Locator {
    store: Arc<dyn ConfigStore>,
    roots: StorageRoots,
}

impl std::fmt::Debug for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locator").field("roots", &self.roots).finish()
    }
}

impl Locator {
    pub fn new(store: Arc<dyn ConfigStore>, roots: StorageRoots) -> Self {
        Self { store, roots }
    }

    pub fn store(&self) -> &dyn ConfigStore {
        self.store.as_ref()
    }

    pub fn roots(&self) -> &StorageRoots {
        &self.roots
    }

    /// Locate one preset.
    ///
    /// Vendors are keyed by family alone (`family`, falling back to `name`).
    /// Installed presets with a family are looked up in that family only;
    /// system presets are looked up by name across all families.
    pub fn locate(
        &self,
        config_type: ConfigType,
        location: ConfigLocation,
        family: Option<&str>,
        name: &str,
    ) -> Result<PresetIdentity, PresetError> {
        let not_found = || PresetError::NotFound {
            config_type,
            location,
            family: family.map(str::to_string),
            name: name.to_string(),
        };

        if location == ConfigLocation::User && config_type.user_subdirectory().is_none() {
            return Err(PresetError::Unsupported {
                config_type,
                location,
            });
        }

        let root = self.roots.root(location).ok_or_else(not_found)?;

        let candidates = match (config_type, location) {
            (ConfigType::Vendor, _) => {
                let family = family.unwrap_or(name);
                let path = manifest_path(root, family);
                if !self.store.exists(&path) {
                    return Err(not_found());
                }
                return Ok(PresetIdentity::new(
                    config_type,
                    location,
                    Some(family.to_string()),
                    family,
                    path,
                ));
            }
            (_, ConfigLocation::User) => self
                .user_presets(config_type, root)
                .into_iter()
                .filter(|id| id.name() == name)
                .collect(),
            (_, ConfigLocation::Installed) if family.is_some() => {
                self.manifest_presets(config_type, location, root, family, Some(name))
            }
            _ => self.manifest_presets(config_type, location, root, None, Some(name)),
        };

        let identity = pick_candidate(candidates, family).ok_or_else(not_found)?;
        debug!(%identity, "located preset");
        Ok(identity)
    }

    /// Every preset of `config_type` in `location`, sorted and deduplicated.
    pub fn search(&self, config_type: ConfigType, location: ConfigLocation) -> Vec<PresetIdentity> {
        let Some(root) = self.roots.root(location) else {
            return Vec::new();
        };

        let mut found = match (config_type, location) {
            (ConfigType::Vendor, ConfigLocation::User) => Vec::new(),
            (ConfigType::Vendor, _) => self
                .families(location)
                .into_iter()
                .map(|family| {
                    let path = manifest_path(root, &family);
                    PresetIdentity::new(config_type, location, Some(family.clone()), family, path)
                })
                .collect(),
            (_, ConfigLocation::User) => self.user_presets(config_type, root),
            _ => self.manifest_presets(config_type, location, root, None, None),
        };

        found.sort();
        found.dedup();
        found
    }

    /// Families with a manifest in `location`, sorted.
    pub fn families(&self, location: ConfigLocation) -> Vec<String> {
        if location == ConfigLocation::User {
            return Vec::new();
        }
        let Some(root) = self.roots.root(location) else {
            return Vec::new();
        };
        match self.store.list_entries(root) {
            Ok(entries) => json_entries(entries)
                .into_iter()
                .map(|(_, stem)| stem)
                .collect(),
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => {
                warn!(root = %root.display(), error = %e, "could not list vendor families");
                Vec::new()
            }
        }
    }

    /// Load the manifest of `family` in `location`.
    pub fn vendor_manifest(
        &self,
        location: ConfigLocation,
        family: &str,
    ) -> Result<(PresetIdentity, VendorManifest), PresetError> {
        let identity = self.locate(ConfigType::Vendor, location, Some(family), family)?;
        let value = self
            .store
            .read_config(identity.path())
            .map_err(StoreError::into_read_error)?;
        let manifest = VendorManifest::from_value(value).map_err(|e| PresetError::Parse {
            path: identity.path().to_path_buf(),
            message: e.to_string(),
        })?;
        Ok((identity, manifest))
    }

    /// Read the record an identity points at.
    pub fn read_record(&self, identity: &PresetIdentity) -> Result<PresetRecord, PresetError> {
        let value = self
            .store
            .read_config(identity.path())
            .map_err(StoreError::into_read_error)?;
        PresetRecord::from_value(value).map_err(|e| PresetError::Parse {
            path: identity.path().to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Whether a preset named `name` already exists in any tier.
    ///
    /// Used before creating or renaming a preset.
    pub fn name_in_use(&self, config_type: ConfigType, name: &str, family: Option<&str>) -> bool {
        ConfigLocation::ALL
            .into_iter()
            .any(|location| self.locate(config_type, location, family, name).is_ok())
    }

    /// Presets listed by vendor manifests, optionally limited to one family
    /// and one name.
    fn manifest_presets(
        &self,
        config_type: ConfigType,
        location: ConfigLocation,
        root: &Path,
        family: Option<&str>,
        name: Option<&str>,
    ) -> Vec<PresetIdentity> {
        let families = match family {
            Some(family) => vec![family.to_string()],
            None => self.families(location),
        };

        let mut found = Vec::new();
        for family in families {
            let manifest = match self.vendor_manifest(location, &family) {
                Ok((_, manifest)) => manifest,
                Err(PresetError::NotFound { .. }) => continue,
                Err(e) => {
                    warn!(%family, %location, error = %e, "skipping malformed vendor manifest");
                    continue;
                }
            };

            let entries = manifest.list_for(config_type).unwrap_or_default();
            for entry in entries {
                if name.is_some_and(|n| n != entry.name) {
                    continue;
                }
                let path = root.join(&family).join(&entry.sub_path);
                found.push(PresetIdentity::new(
                    config_type,
                    location,
                    Some(family.clone()),
                    entry.name.clone(),
                    path,
                ));
            }
        }
        found
    }

    /// User presets of one type, named by their `name` property or, for
    /// records without a usable one, by file stem.
    fn user_presets(&self, config_type: ConfigType, root: &Path) -> Vec<PresetIdentity> {
        let Some(subdir) = config_type.user_subdirectory() else {
            return Vec::new();
        };
        let dir = root.join(subdir);

        let mut found = Vec::new();
        for dir in [dir.clone(), dir.join(USER_BASE_DIR)] {
            let entries = match self.store.list_entries(&dir) {
                Ok(entries) => entries,
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "could not list user presets");
                    continue;
                }
            };

            for (entry, stem) in json_entries(entries) {
                let path = dir.join(&entry);
                let name = self
                    .store
                    .read_config(&path)
                    .ok()
                    .and_then(|value| PresetRecord::from_value(value).ok())
                    .and_then(|record| record.name().map(str::to_string))
                    .unwrap_or(stem);
                found.push(PresetIdentity::new(
                    config_type,
                    ConfigLocation::User,
                    None,
                    name,
                    path,
                ));
            }
        }
        found
    }
}

fn manifest_path(root: &Path, family: &str) -> PathBuf {
    root.join(format!("{}.json", family))
}

/// Deterministic choice among duplicate matches.
fn pick_candidate(
    mut candidates: Vec<PresetIdentity>,
    family: Option<&str>,
) -> Option<PresetIdentity> {
    candidates.sort();
    if candidates.len() > 1 {
        debug!(count = candidates.len(), "multiple presets match; applying tie-break");
    }
    let preferred = family.and_then(|f| candidates.iter().position(|c| c.family() == Some(f)));
    match preferred {
        Some(index) => Some(candidates.swap_remove(index)),
        None => candidates.into_iter().next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn fixture() -> (Arc<MemoryStore>, Locator) {
        let store = Arc::new(MemoryStore::new());
        store.insert(
            "/sys/BBL.json",
            json!({
                "name": "BBL",
                "version": "1.0",
                "filament_list": [
                    {"name": "Generic PLA", "sub_path": "filament/Generic PLA.json"}
                ]
            }),
        );
        store.insert(
            "/sys/Anker.json",
            json!({
                "name": "Anker",
                "version": "1.0",
                "filament_list": [
                    {"name": "Generic PLA", "sub_path": "filament/pla.json"}
                ]
            }),
        );
        store.insert("/sys/Broken.json", json!("not a manifest"));
        store.insert("/user/filament/a.json", json!({"name": "My PLA"}));
        store.insert("/user/filament/base/b.json", json!({"name": "Base PLA"}));
        store.insert("/user/filament/nameless.json", json!({"inherits": "Base PLA"}));

        let roots = StorageRoots {
            installed: None,
            system: Some(PathBuf::from("/sys")),
            user: Some(PathBuf::from("/user")),
        };
        let locator = Locator::new(store.clone(), roots);
        (store, locator)
    }

    #[test]
    fn test_duplicate_names_prefer_family_then_first() {
        let (_, locator) = fixture();

        let id = locator
            .locate(ConfigType::Filament, ConfigLocation::System, Some("BBL"), "Generic PLA")
            .unwrap();
        assert_eq!(id.family(), Some("BBL"));
        assert_eq!(id.path(), Path::new("/sys/BBL/filament/Generic PLA.json"));

        let id = locator
            .locate(ConfigType::Filament, ConfigLocation::System, None, "Generic PLA")
            .unwrap();
        assert_eq!(id.family(), Some("Anker"));
    }

    #[test]
    fn test_user_presets_by_name_or_stem() {
        let (_, locator) = fixture();

        let names: Vec<_> = locator
            .search(ConfigType::Filament, ConfigLocation::User)
            .iter()
            .map(|id| id.name().to_string())
            .collect();
        assert_eq!(names, vec!["Base PLA", "My PLA", "nameless"]);

        let id = locator
            .locate(ConfigType::Filament, ConfigLocation::User, None, "Base PLA")
            .unwrap();
        assert_eq!(id.path(), Path::new("/user/filament/base/b.json"));
    }

    #[test]
    fn test_vendor_keyed_by_family() {
        let (_, locator) = fixture();

        let id = locator
            .locate(ConfigType::Vendor, ConfigLocation::System, Some("BBL"), "ignored")
            .unwrap();
        assert_eq!(id.name(), "BBL");
        assert_eq!(locator.families(ConfigLocation::System), vec!["Anker", "BBL", "Broken"]);
        assert_eq!(locator.search(ConfigType::Vendor, ConfigLocation::System).len(), 3);
    }

    #[test]
    fn test_user_tier_has_no_vendors() {
        let (_, locator) = fixture();
        let err = locator
            .locate(ConfigType::PrinterModel, ConfigLocation::User, None, "X1C")
            .unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED");
    }

    #[test]
    fn test_missing_tier_root_is_not_found() {
        let (_, locator) = fixture();
        let err = locator
            .locate(ConfigType::Filament, ConfigLocation::Installed, Some("BBL"), "Generic PLA")
            .unwrap_err();
        assert!(matches!(err, PresetError::NotFound { .. }));
        assert!(locator.search(ConfigType::Printer, ConfigLocation::Installed).is_empty());
    }

    #[test]
    fn test_numeric_manifest_version_keeps_family_loadable() {
        let (store, locator) = fixture();
        store.insert(
            "/sys/Qidi.json",
            json!({
                "name": "Qidi",
                "version": 2,
                "machine_list": [{"name": "fdm_qidi", "sub_path": "machine/fdm_qidi.json"}]
            }),
        );
        store.insert("/sys/Qidi/machine/fdm_qidi.json", json!({"name": "fdm_qidi"}));

        let id = locator
            .locate(ConfigType::Printer, ConfigLocation::System, Some("Qidi"), "fdm_qidi")
            .unwrap();
        assert_eq!(id.path(), Path::new("/sys/Qidi/machine/fdm_qidi.json"));
        let (_, manifest) = locator.vendor_manifest(ConfigLocation::System, "Qidi").unwrap();
        assert_eq!(manifest.version.as_deref(), Some("2"));
    }

    #[test]
    fn test_name_in_use_checks_all_tiers() {
        let (_, locator) = fixture();
        assert!(locator.name_in_use(ConfigType::Filament, "Generic PLA", None));
        assert!(locator.name_in_use(ConfigType::Filament, "My PLA", None));
        assert!(!locator.name_in_use(ConfigType::Filament, "Fresh PLA", None));
    }
}
