//! Tool settings
//!
//! Settings are merged from three layers, last wins:
//! 1. Built-in defaults
//! 2. User settings file (~/.config/slicer-presets/config.toml)
//! 3. CLI flags

mod defaults;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use merge::{deep_merge, merge_layers};
pub use settings::{
    default_settings_path, installed_profiles_dir, Settings, SettingsError, SettingsOrigin,
    SettingsSource, MAX_CHAIN_DEPTH_LIMIT,
};
