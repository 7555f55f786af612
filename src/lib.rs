//! Slicer presets - inheritance resolution for 3D-printing slicer profiles
//!
//! Vendor, printer, filament and process presets are flat key-value records
//! that may name one parent through `inherits`. This crate locates presets
//! across the installed, system and user tiers, resolves their chains,
//! merges them with per-property provenance, classifies keys against the
//! schema in `preset-schema`, flattens presets for export and edits them
//! through sessions that only ever write what the preset itself owns.

pub mod analysis;
pub mod chain;
pub mod classify;
pub mod config;
pub mod error;
pub mod flatten;
pub mod locator;
pub mod logging;
pub mod merge;
pub mod preset;
pub mod resolver;
pub mod session;
pub mod store;

pub use preset_schema::{schema_for, ConfigLocation, ConfigType, Schema, SchemaEntry};

pub use analysis::{analyse_vendor, VendorAnalysis};
pub use chain::{resolve_chain, Chain, ChainError, ChainLink, ChainOptions};
pub use classify::{classify, Classification};
pub use config::{Settings, SettingsError};
pub use error::{PresetError, ValidationWarning};
pub use flatten::{
    export_batch, flatten, flatten_batch, flatten_resolved, DirectorySink, ExportSink,
    FlattenedPreset,
};
pub use locator::{Locator, StorageRoots};
pub use merge::{merge, ResolvedConfig, ResolvedProperty};
pub use preset::{PresetIdentity, PresetRecord, VendorManifest};
pub use resolver::{BatchItem, BatchSummary, Resolver};
pub use session::{DeleteOutcome, EditSession, SessionError, SessionState};
pub use store::{ConfigStore, FsStore, MemoryStore, StoreError};
