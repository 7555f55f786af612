//! Merge engine
//!
//! Folds a chain into one property map, root first. A key defined at
//! several levels takes the value of the most leaf-ward one; vectors are
//! replaced wholesale. Each resolved property remembers the level and the
//! preset it came from, which is what lets an editor write back only what
//! the leaf itself defines.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::chain::Chain;
use crate::classify::Classification;
use crate::error::ValidationWarning;
use crate::preset::{PresetIdentity, INHERITS_KEY, NAME_KEY};

/// A merged value and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProperty {
    pub value: Value,
    /// Chain level that last defined the value (0 = root)
    pub origin_level: usize,
    pub source: PresetIdentity,
}

/// The merged view of a preset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    leaf: PresetIdentity,
    leaf_level: usize,
    leaf_inherits: Option<String>,
    /// The leaf's stored properties, nulls included
    #[serde(skip)]
    leaf_record: Map<String, Value>,
    properties: BTreeMap<String, ResolvedProperty>,
    known: BTreeSet<String>,
    unknown: BTreeSet<String>,
    missing_required: BTreeSet<String>,
    warnings: Vec<ValidationWarning>,
}

/// Merge `chain` into a [`ResolvedConfig`].
///
/// `inherits` never enters the result and null values count as absent.
/// `name` always belongs to the leaf. Known/unknown sets stay empty until
/// [`ResolvedConfig::apply_classification`] is called.
pub fn merge(chain: &Chain) -> ResolvedConfig {
    let mut properties: BTreeMap<String, ResolvedProperty> = BTreeMap::new();

    for (level, link) in chain.links().iter().enumerate() {
        for (key, value) in link.record.properties() {
            if key == INHERITS_KEY || value.is_null() {
                continue;
            }
            properties.insert(
                key.clone(),
                ResolvedProperty {
                    value: value.clone(),
                    origin_level: level,
                    source: link.identity.clone(),
                },
            );
        }
    }

    let leaf = chain.leaf();
    let leaf_level = chain.leaf_level();
    let leaf_name = leaf
        .record
        .name()
        .unwrap_or_else(|| leaf.identity.name())
        .to_string();
    properties.insert(
        NAME_KEY.to_string(),
        ResolvedProperty {
            value: Value::String(leaf_name),
            origin_level: leaf_level,
            source: leaf.identity.clone(),
        },
    );

    ResolvedConfig {
        leaf: leaf.identity.clone(),
        leaf_level,
        leaf_inherits: leaf.record.inherits().map(str::to_string),
        leaf_record: leaf.record.properties().clone(),
        properties,
        known: BTreeSet::new(),
        unknown: BTreeSet::new(),
        missing_required: BTreeSet::new(),
        warnings: chain.warnings().to_vec(),
    }
}

impl ResolvedConfig {
    pub fn leaf(&self) -> &PresetIdentity {
        &self.leaf
    }

    pub fn leaf_level(&self) -> usize {
        self.leaf_level
    }

    /// The leaf's own parent pointer.
    pub fn leaf_inherits(&self) -> Option<&str> {
        self.leaf_inherits.as_deref()
    }

    pub fn properties(&self) -> &BTreeMap<String, ResolvedProperty> {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<&ResolvedProperty> {
        self.properties.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).map(|p| &p.value)
    }

    /// Whether the leaf itself defines `key`, even as null.
    pub fn is_leaf_defined(&self, key: &str) -> bool {
        self.leaf_record.contains_key(key) || self.resolved_at_leaf(key).is_some()
    }

    /// Keys defined by the leaf, in key order.
    pub fn leaf_keys(&self) -> impl Iterator<Item = &str> {
        let keys: BTreeSet<&str> = self
            .leaf_record
            .keys()
            .map(String::as_str)
            .chain(
                self.properties
                    .iter()
                    .filter(|(_, p)| p.origin_level == self.leaf_level)
                    .map(|(k, _)| k.as_str()),
            )
            .collect();
        keys.into_iter()
    }

    /// The value the leaf itself stores for `key`, as written.
    pub fn leaf_value(&self, key: &str) -> Option<&Value> {
        self.leaf_record
            .get(key)
            .or_else(|| self.resolved_at_leaf(key).map(|p| &p.value))
    }

    fn resolved_at_leaf(&self, key: &str) -> Option<&ResolvedProperty> {
        self.properties
            .get(key)
            .filter(|p| p.origin_level == self.leaf_level)
    }

    pub fn known(&self) -> &BTreeSet<String> {
        &self.known
    }

    pub fn unknown(&self) -> &BTreeSet<String> {
        &self.unknown
    }

    pub fn missing_required(&self) -> &BTreeSet<String> {
        &self.missing_required
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// Plain `(key, value)` pairs of the resolved map.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, p)| (k.as_str(), &p.value))
    }

    /// The resolved map without provenance.
    pub fn to_value_map(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .map(|(k, p)| (k.clone(), p.value.clone()))
            .collect()
    }

    /// Record the classifier's verdict. Chain warnings are kept.
    pub fn apply_classification(&mut self, classification: Classification) {
        self.known = classification.known;
        self.unknown = classification.unknown;
        self.missing_required = classification.missing_required;
        self.warnings.extend(classification.warnings);
    }

    /// Set a value as if the leaf defined it.
    pub(crate) fn set_leaf_property(&mut self, key: &str, value: Value) {
        if key == INHERITS_KEY {
            self.leaf_inherits = value.as_str().map(str::to_string).filter(|s| !s.is_empty());
            return;
        }
        self.leaf_record.insert(key.to_string(), value.clone());
        if value.is_null() {
            if self.resolved_at_leaf(key).is_some() {
                self.properties.remove(key);
            }
            return;
        }
        self.properties.insert(
            key.to_string(),
            ResolvedProperty {
                value,
                origin_level: self.leaf_level,
                source: self.leaf.clone(),
            },
        );
    }

    /// Drop a leaf-defined value. Inherited values are left alone.
    pub(crate) fn remove_leaf_property(&mut self, key: &str) -> bool {
        let stored = self.leaf_record.remove(key).is_some();
        let resolved = self.resolved_at_leaf(key).is_some();
        if resolved {
            self.properties.remove(key);
            self.known.remove(key);
            self.unknown.remove(key);
        }
        stored || resolved
    }
}
