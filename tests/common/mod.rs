//! Shared fixtures: a temporary slicer data layout on disk.

#![allow(dead_code)]

use serde_json::{json, Value};
use slicer_presets::{
    ConfigLocation, ConfigStore, ConfigType, FsStore, Locator, PresetIdentity, Resolver, Settings,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub settings: Settings,
    pub store: Arc<dyn ConfigStore>,
    pub resolver: Resolver,
}

impl Fixture {
    /// Empty installation and data directories under a temp dir.
    pub fn new() -> Self {
        Self::with_overrides(json!({}))
    }

    /// Like [`Fixture::new`] with extra settings layered on top.
    pub fn with_overrides(extra: Value) -> Self {
        slicer_presets::logging::init_test();

        let dir = TempDir::new().unwrap();
        let mut cli = json!({
            "installation_dir": dir.path().join("install").to_string_lossy(),
            "data_dir": dir.path().join("data").to_string_lossy(),
        });
        if let (Some(cli), Some(extra)) = (cli.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                cli.insert(k.clone(), v.clone());
            }
        }
        let settings = Settings::build(None, Some(cli)).unwrap();

        let store: Arc<dyn ConfigStore> = Arc::new(FsStore::new());
        let locator = Locator::new(store.clone(), settings.storage_roots());
        let resolver = Resolver::new(locator, settings.chain_options());
        Self {
            dir,
            settings,
            store,
            resolver,
        }
    }

    pub fn root(&self, location: ConfigLocation) -> PathBuf {
        self.settings
            .storage_roots()
            .root(location)
            .unwrap()
            .to_path_buf()
    }

    pub fn write(&self, path: &Path, value: Value) {
        let map = value.as_object().cloned().unwrap_or_default();
        self.store.write_config(path, &map).unwrap();
    }

    pub fn write_raw(&self, path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    /// Write `<user>/<type dir>/<file>.json` and return its path.
    pub fn user_preset(&self, config_type: ConfigType, file: &str, value: Value) -> PathBuf {
        let path = self
            .root(ConfigLocation::User)
            .join(config_type.user_subdirectory().unwrap())
            .join(format!("{}.json", file));
        self.write(&path, value);
        path
    }

    /// Write a vendor manifest listing `presets`, plus each preset file at
    /// `<family>/<type dir>/<name>.json`.
    pub fn vendor(
        &self,
        location: ConfigLocation,
        family: &str,
        presets: &[(ConfigType, Value)],
    ) {
        let root = self.root(location);
        let mut manifest = json!({
            "name": family,
            "version": "01.00.00.00",
            "machine_model_list": [],
            "machine_list": [],
            "filament_list": [],
            "process_list": [],
        });

        for (config_type, record) in presets {
            let name = record["name"].as_str().unwrap();
            let sub_path = format!(
                "{}/{}.json",
                config_type.user_subdirectory().unwrap_or("machine"),
                name
            );
            let list_key = config_type.vendor_list_key().unwrap();
            manifest[list_key]
                .as_array_mut()
                .unwrap()
                .push(json!({"name": name, "sub_path": sub_path}));
            self.write(&root.join(family).join(&sub_path), record.clone());
        }

        self.write(&root.join(format!("{}.json", family)), manifest);
    }

    pub fn locate(
        &self,
        config_type: ConfigType,
        location: ConfigLocation,
        family: Option<&str>,
        name: &str,
    ) -> PresetIdentity {
        self.resolver
            .locate(config_type, location, family, name)
            .unwrap()
    }

    pub fn user(&self, config_type: ConfigType, name: &str) -> PresetIdentity {
        self.locate(config_type, ConfigLocation::User, None, name)
    }
}
