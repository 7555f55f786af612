//! Chain resolver
//!
//! Walks `inherits` pointers from a leaf preset up to its root and returns
//! the records in root-to-leaf order. Every hop is a lookup that depends on
//! the previous one, so a chain is always built sequentially.
//!
//! Parent search order:
//! - user presets: user tier, then system, then installed
//! - system/installed presets: the same tier and family
//! - filament presets additionally fall back to the shared filament
//!   library family in the system tier (and, for installed presets, in the
//!   installed tier)
//!
//! A repeated identity or more than `max_depth` links ends the walk with
//! [`PresetError::Cycle`].

use preset_schema::{ConfigLocation, ConfigType};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::{PresetError, ValidationWarning};
use crate::locator::Locator;
use crate::preset::{PresetIdentity, PresetRecord};

/// Default limit on the number of links in one chain.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Family holding filament presets shared across vendors.
pub const DEFAULT_SHARED_FILAMENT_FAMILY: &str = "OrcaFilamentLibrary";

/// Tunables for chain resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOptions {
    /// Maximum number of links, leaf included
    pub max_depth: usize,
    /// Family searched for filament parents outside the preset's own family
    pub shared_filament_family: Option<String>,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            shared_filament_family: Some(DEFAULT_SHARED_FILAMENT_FAMILY.to_string()),
        }
    }
}

/// One resolved level of a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLink {
    pub identity: PresetIdentity,
    pub record: PresetRecord,
}

/// A complete inheritance chain, root first.
///
/// Never empty: the last link is the leaf that resolution started from.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    links: Vec<ChainLink>,
    warnings: Vec<ValidationWarning>,
}

impl Chain {
    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn root(&self) -> &ChainLink {
        &self.links[0]
    }

    pub fn leaf(&self) -> &ChainLink {
        &self.links[self.links.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Always false for a built chain.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Origin level of the leaf (root is level 0).
    pub fn leaf_level(&self) -> usize {
        self.links.len() - 1
    }

    /// Warnings raised while walking the chain.
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }
}

/// Resolution failure together with whatever part of the chain was built.
///
/// `partial` is leaf first: it holds the links walked before the failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct ChainError {
    pub error: PresetError,
    pub partial: Vec<ChainLink>,
}

impl From<ChainError> for PresetError {
    fn from(err: ChainError) -> Self {
        err.error
    }
}

/// Resolve the chain ending at `leaf`.
pub fn resolve_chain(
    locator: &Locator,
    leaf: &PresetIdentity,
    options: &ChainOptions,
) -> Result<Chain, ChainError> {
    let mut links: Vec<ChainLink> = Vec::new();
    let mut warnings = Vec::new();
    let mut visited: HashSet<PresetIdentity> = HashSet::new();
    let mut current = leaf.clone();

    loop {
        if !visited.insert(current.clone()) {
            return Err(ChainError {
                error: PresetError::Cycle {
                    name: current.name().to_string(),
                    depth: links.len(),
                },
                partial: links,
            });
        }

        let record = match locator.read_record(&current) {
            Ok(record) => record,
            Err(error) => {
                return Err(ChainError {
                    error,
                    partial: links,
                })
            }
        };
        // Vendors and printer models never inherit; a stray pointer is ignored.
        let parent_name = if current.config_type().supports_inheritance() {
            record.inherits().map(str::to_string)
        } else {
            None
        };
        debug!(
            preset = %current,
            depth = links.len(),
            parent = parent_name.as_deref().unwrap_or("-"),
            "chain hop"
        );
        links.push(ChainLink {
            identity: current.clone(),
            record,
        });

        let Some(parent_name) = parent_name else {
            break;
        };

        if links.len() >= options.max_depth {
            return Err(ChainError {
                error: PresetError::Cycle {
                    name: parent_name,
                    depth: links.len(),
                },
                partial: links,
            });
        }

        match locate_parent(locator, &current, &parent_name, options) {
            Some((parent, warning)) => {
                if let Some(warning) = warning {
                    warnings.push(warning);
                }
                current = parent;
            }
            None => {
                return Err(ChainError {
                    error: PresetError::MissingParent {
                        child: current.name().to_string(),
                        parent: parent_name,
                    },
                    partial: links,
                })
            }
        }
    }

    links.reverse();
    Ok(Chain { links, warnings })
}

/// Candidate scopes for the parent of `child`, in search order.
fn parent_scopes<'a>(
    child: &'a PresetIdentity,
    options: &'a ChainOptions,
) -> Vec<(ConfigLocation, Option<&'a str>)> {
    let family = child.family();
    let mut scopes = match child.location() {
        ConfigLocation::User => vec![
            (ConfigLocation::User, None),
            (ConfigLocation::System, family),
            (ConfigLocation::Installed, family),
        ],
        location => vec![(location, family)],
    };

    if child.config_type() == ConfigType::Filament {
        if let Some(shared) = options.shared_filament_family.as_deref() {
            if family != Some(shared) {
                scopes.push((ConfigLocation::System, Some(shared)));
                if child.location() == ConfigLocation::Installed {
                    scopes.push((ConfigLocation::Installed, Some(shared)));
                }
            }
        }
    }
    scopes
}

fn locate_parent(
    locator: &Locator,
    child: &PresetIdentity,
    parent_name: &str,
    options: &ChainOptions,
) -> Option<(PresetIdentity, Option<ValidationWarning>)> {
    for (location, family) in parent_scopes(child, options) {
        match locator.locate(child.config_type(), location, family, parent_name) {
            Ok(parent) => {
                let warning = if child.location() == ConfigLocation::User
                    && location == ConfigLocation::Installed
                {
                    warn!(
                        child = %child,
                        parent = parent_name,
                        "could not find ancestor in loaded presets; using the installed one"
                    );
                    Some(ValidationWarning::AncestorOutsideLoadedTier {
                        name: parent_name.to_string(),
                    })
                } else {
                    None
                };
                return Some((parent, warning));
            }
            Err(e) => {
                debug!(parent = parent_name, %location, error = %e, "parent not in scope");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::StorageRoots;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn locator(store: MemoryStore) -> Locator {
        Locator::new(
            Arc::new(store),
            StorageRoots {
                installed: Some(PathBuf::from("/inst")),
                system: Some(PathBuf::from("/sys")),
                user: Some(PathBuf::from("/user")),
            },
        )
    }

    fn user_printer(locator: &Locator, name: &str) -> PresetIdentity {
        locator
            .locate(ConfigType::Printer, ConfigLocation::User, None, name)
            .unwrap()
    }

    #[test]
    fn test_user_chain_root_first() {
        let store = MemoryStore::new();
        store.insert("/user/machine/base.json", json!({"name": "BaseX", "nozzle_diameter": "0.4"}));
        store.insert("/user/machine/mid.json", json!({"name": "MidX", "inherits": "BaseX"}));
        store.insert("/user/machine/leaf.json", json!({"name": "LeafX", "inherits": "MidX"}));
        let locator = locator(store);

        let leaf = user_printer(&locator, "LeafX");
        let chain = resolve_chain(&locator, &leaf, &ChainOptions::default()).unwrap();

        let names: Vec<_> = chain.links().iter().map(|l| l.identity.name()).collect();
        assert_eq!(names, vec!["BaseX", "MidX", "LeafX"]);
        assert_eq!(chain.leaf_level(), 2);
        assert_eq!(chain.leaf().identity, leaf);
        assert!(chain.warnings().is_empty());
    }

    #[test]
    fn test_two_node_cycle() {
        let store = MemoryStore::new();
        store.insert("/user/machine/a.json", json!({"name": "A", "inherits": "B"}));
        store.insert("/user/machine/b.json", json!({"name": "B", "inherits": "A"}));
        let locator = locator(store);

        let err = resolve_chain(&locator, &user_printer(&locator, "A"), &ChainOptions::default())
            .unwrap_err();
        assert_eq!(err.error.code(), "CYCLE");
        assert_eq!(err.partial.len(), 2);
    }

    #[test]
    fn test_depth_guard() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store.insert(
                format!("/user/machine/p{}.json", i),
                json!({"name": format!("P{}", i), "inherits": format!("P{}", i + 1)}),
            );
        }
        store.insert("/user/machine/p10.json", json!({"name": "P10"}));
        let locator = locator(store);
        let leaf = user_printer(&locator, "P0");

        let options = ChainOptions {
            max_depth: 4,
            ..ChainOptions::default()
        };
        let err = resolve_chain(&locator, &leaf, &options).unwrap_err();
        assert_eq!(err.error, PresetError::Cycle { name: "P4".to_string(), depth: 4 });

        let chain = resolve_chain(&locator, &leaf, &ChainOptions::default()).unwrap();
        assert_eq!(chain.len(), 11);
    }

    #[test]
    fn test_missing_parent_keeps_partial_chain() {
        let store = MemoryStore::new();
        store.insert("/user/machine/leaf.json", json!({"name": "LeafX", "inherits": "Ghost"}));
        let locator = locator(store);

        let err = resolve_chain(&locator, &user_printer(&locator, "LeafX"), &ChainOptions::default())
            .unwrap_err();
        assert_eq!(
            err.error,
            PresetError::MissingParent {
                child: "LeafX".to_string(),
                parent: "Ghost".to_string()
            }
        );
        assert_eq!(err.partial.len(), 1);
    }

    #[test]
    fn test_user_parent_from_installed_warns() {
        let store = MemoryStore::new();
        store.insert(
            "/inst/BBL.json",
            json!({"machine_list": [{"name": "fdm_bbl", "sub_path": "machine/fdm_bbl.json"}]}),
        );
        store.insert("/inst/BBL/machine/fdm_bbl.json", json!({"name": "fdm_bbl", "gcode_flavor": "marlin"}));
        store.insert("/user/machine/mine.json", json!({"name": "Mine", "inherits": "fdm_bbl"}));
        let locator = locator(store);

        let chain = resolve_chain(&locator, &user_printer(&locator, "Mine"), &ChainOptions::default())
            .unwrap();
        assert_eq!(chain.root().identity.location(), ConfigLocation::Installed);
        assert_eq!(
            chain.warnings(),
            &[ValidationWarning::AncestorOutsideLoadedTier { name: "fdm_bbl".to_string() }]
        );
    }

    #[test]
    fn test_installed_filament_falls_back_to_shared_library() {
        let store = MemoryStore::new();
        store.insert(
            "/inst/BBL.json",
            json!({"filament_list": [{"name": "Bambu PLA", "sub_path": "filament/pla.json"}]}),
        );
        store.insert("/inst/BBL/filament/pla.json", json!({"name": "Bambu PLA", "inherits": "fdm_filament_pla"}));
        store.insert(
            "/inst/OrcaFilamentLibrary.json",
            json!({"filament_list": [{"name": "fdm_filament_pla", "sub_path": "filament/fdm_filament_pla.json"}]}),
        );
        store.insert(
            "/inst/OrcaFilamentLibrary/filament/fdm_filament_pla.json",
            json!({"name": "fdm_filament_pla", "filament_type": ["PLA"]}),
        );
        let locator = locator(store);

        let leaf = locator
            .locate(ConfigType::Filament, ConfigLocation::Installed, Some("BBL"), "Bambu PLA")
            .unwrap();
        let chain = resolve_chain(&locator, &leaf, &ChainOptions::default()).unwrap();
        assert_eq!(chain.root().identity.family(), Some("OrcaFilamentLibrary"));
        assert_eq!(chain.root().identity.location(), ConfigLocation::Installed);

        let options = ChainOptions {
            shared_filament_family: None,
            ..ChainOptions::default()
        };
        let err = resolve_chain(&locator, &leaf, &options).unwrap_err();
        assert_eq!(err.error.code(), "MISSING_PARENT");
    }

    #[test]
    fn test_printer_model_pointer_is_not_followed() {
        let store = MemoryStore::new();
        store.insert(
            "/inst/BBL.json",
            json!({"machine_model_list": [{"name": "Bambu Lab X1", "sub_path": "machine/X1.json"}]}),
        );
        store.insert(
            "/inst/BBL/machine/X1.json",
            json!({"name": "Bambu Lab X1", "inherits": "Nowhere", "nozzle_diameter": "0.4"}),
        );
        let locator = locator(store);

        let leaf = locator
            .locate(ConfigType::PrinterModel, ConfigLocation::Installed, Some("BBL"), "Bambu Lab X1")
            .unwrap();
        let chain = resolve_chain(&locator, &leaf, &ChainOptions::default()).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.leaf().record.inherits(), Some("Nowhere"));
    }
}
