//! Preset data model
//!
//! - [`PresetIdentity`]: where a preset lives (type, tier, family, name, path)
//! - [`PresetRecord`]: a stored record split into properties and `inherits`
//! - [`VendorManifest`]: the per-family index of preset files

mod identity;
mod record;
mod vendor;

pub use identity::PresetIdentity;
pub use record::{PresetRecord, RecordError, INHERITS_KEY, NAME_KEY};
pub use vendor::{ConfigNameAndPath, VendorManifest};
