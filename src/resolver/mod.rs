//! Resolution pipeline
//!
//! Locator → chain → merge → classify, plus batch variants that report one
//! outcome per preset. A broken preset never stops its siblings.

use preset_schema::{schema_for, ConfigLocation, ConfigType};
use serde::Serialize;
use tracing::{debug, warn};

use crate::chain::{resolve_chain, Chain, ChainError, ChainOptions};
use crate::classify::classify;
use crate::error::PresetError;
use crate::locator::Locator;
use crate::merge::{merge, ResolvedConfig};
use crate::preset::PresetIdentity;

/// Outcome for one item of a batch operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem<T> {
    pub identity: PresetIdentity,
    pub outcome: Result<T, PresetError>,
}

impl<T> BatchItem<T> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Counts over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn of<T>(items: &[BatchItem<T>]) -> Self {
        let succeeded = items.iter().filter(|i| i.is_ok()).count();
        Self {
            total: items.len(),
            succeeded,
            failed: items.len() - succeeded,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Read-only resolution facade.
///
/// Holds no mutable state: one resolver may be shared across threads and
/// used to resolve independent presets concurrently.
#[derive(Debug, Clone)]
pub struct Resolver {
    locator: Locator,
    options: ChainOptions,
}

impl Resolver {
    pub fn new(locator: Locator, options: ChainOptions) -> Self {
        Self { locator, options }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn options(&self) -> &ChainOptions {
        &self.options
    }

    /// Shorthand for [`Locator::locate`].
    pub fn locate(
        &self,
        config_type: ConfigType,
        location: ConfigLocation,
        family: Option<&str>,
        name: &str,
    ) -> Result<PresetIdentity, PresetError> {
        self.locator.locate(config_type, location, family, name)
    }

    pub fn resolve_chain(&self, identity: &PresetIdentity) -> Result<Chain, ChainError> {
        resolve_chain(&self.locator, identity, &self.options)
    }

    /// Resolve, merge and classify one preset.
    pub fn resolve(&self, identity: &PresetIdentity) -> Result<ResolvedConfig, PresetError> {
        let chain = self.resolve_chain(identity)?;
        let mut resolved = merge(&chain);
        let classification = classify(
            resolved.values(),
            schema_for(identity.config_type()),
            identity.location(),
        );
        resolved.apply_classification(classification);
        debug!(
            preset = %identity,
            levels = chain.len(),
            properties = resolved.properties().len(),
            missing_required = resolved.missing_required().len(),
            "resolved preset"
        );
        Ok(resolved)
    }

    /// Resolve each identity independently, in order.
    pub fn resolve_batch(&self, identities: &[PresetIdentity]) -> Vec<BatchItem<ResolvedConfig>> {
        identities
            .iter()
            .map(|identity| {
                let outcome = self.resolve(identity);
                if let Err(e) = &outcome {
                    warn!(preset = %identity, error = %e, "could not resolve preset");
                }
                BatchItem {
                    identity: identity.clone(),
                    outcome,
                }
            })
            .collect()
    }

    /// Resolve every preset of `config_type` stored in `location`.
    pub fn list(
        &self,
        config_type: ConfigType,
        location: ConfigLocation,
    ) -> Vec<BatchItem<ResolvedConfig>> {
        let identities = self.locator.search(config_type, location);
        self.resolve_batch(&identities)
    }
}
