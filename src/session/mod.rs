//! Edit sessions
//!
//! An [`EditSession`] holds the resolved view of one preset plus edits that
//! have not been written yet. A commit writes only what the leaf preset
//! itself owns: its leaf-level keys that were not deleted, its `inherits`
//! pointer and the pending edits. Inherited values are never copied into
//! the leaf and can only be changed by overriding them.

mod state;

pub use state::SessionState;

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::error::PresetError;
use crate::merge::ResolvedConfig;
use crate::preset::{PresetIdentity, INHERITS_KEY};
use crate::resolver::Resolver;
use crate::store::StoreError;

/// Errors for edit session operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Session is not ready for edits (state {0:?})")]
    NotReady(SessionState),

    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    #[error("could not resolve preset: {0}")]
    Resolve(PresetError),

    #[error("commit failed: {0}")]
    Write(PresetError),
}

/// What `delete_property` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// A leaf-defined key was marked for removal
    Deleted,
    /// A pending edit was dropped
    PendingDiscarded,
    /// The key is inherited; nothing changed
    Inherited,
    /// No such key
    Absent,
}

impl DeleteOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted | DeleteOutcome::PendingDiscarded)
    }
}

/// Working copy of one preset in an editor.
#[derive(Debug, Clone)]
pub struct EditSession {
    identity: PresetIdentity,
    state: SessionState,
    resolved: Option<ResolvedConfig>,
    pending: BTreeMap<String, Value>,
    deleted: BTreeSet<String>,
    last_error: Option<PresetError>,
}

impl EditSession {
    /// Create a session in the UNINITIALIZED state
    pub fn new(identity: PresetIdentity) -> Self {
        Self {
            identity,
            state: SessionState::Uninitialized,
            resolved: None,
            pending: BTreeMap::new(),
            deleted: BTreeSet::new(),
            last_error: None,
        }
    }

    /// Create a session and load it.
    pub fn open(resolver: &Resolver, identity: PresetIdentity) -> Result<Self, SessionError> {
        let mut session = Self::new(identity);
        session.load(resolver)?;
        Ok(session)
    }

    /// Resolve the preset. Any pending edits are dropped.
    pub fn load(&mut self, resolver: &Resolver) -> Result<(), SessionError> {
        self.transition(SessionState::Loading)?;
        match resolver.resolve(&self.identity) {
            Ok(resolved) => {
                self.resolved = Some(resolved);
                self.pending.clear();
                self.deleted.clear();
                self.transition(SessionState::Ready)
            }
            Err(e) => {
                self.transition(SessionState::Uninitialized)?;
                Err(SessionError::Resolve(e))
            }
        }
    }

    pub fn identity(&self) -> &PresetIdentity {
        &self.identity
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn resolved(&self) -> Option<&ResolvedConfig> {
        self.resolved.as_ref()
    }

    pub fn pending(&self) -> &BTreeMap<String, Value> {
        &self.pending
    }

    pub fn deleted(&self) -> &BTreeSet<String> {
        &self.deleted
    }

    /// Error of the last failed commit, until acknowledged
    pub fn last_error(&self) -> Option<&PresetError> {
        self.last_error.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty() || !self.deleted.is_empty()
    }

    /// The value an editor should show for `key`.
    pub fn value(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.pending.get(key) {
            return Some(value);
        }
        if self.deleted.contains(key) {
            return None;
        }
        self.resolved.as_ref()?.value(key)
    }

    /// Record an edit. The resolved view and its origin metadata are untouched.
    pub fn set_property(&mut self, key: &str, value: Value) -> Result<(), SessionError> {
        self.require_ready()?;
        self.deleted.remove(key);
        self.pending.insert(key.to_string(), value);
        self.transition(SessionState::Ready)
    }

    /// Remove a key the leaf defines, or drop a pending edit.
    ///
    /// Inherited keys cannot be removed from a leaf; deleting one is a no-op
    /// reported as [`DeleteOutcome::Inherited`].
    pub fn delete_property(&mut self, key: &str) -> Result<DeleteOutcome, SessionError> {
        self.require_ready()?;
        let resolved = self.resolved.as_ref().ok_or(SessionError::NotReady(self.state))?;

        let leaf_defined = if key == INHERITS_KEY {
            resolved.leaf_inherits().is_some()
        } else {
            resolved.is_leaf_defined(key)
        };
        let had_pending = self.pending.remove(key).is_some();

        let outcome = if leaf_defined {
            self.deleted.insert(key.to_string());
            DeleteOutcome::Deleted
        } else if had_pending {
            DeleteOutcome::PendingDiscarded
        } else if resolved.get(key).is_some() {
            DeleteOutcome::Inherited
        } else {
            DeleteOutcome::Absent
        };

        debug!(preset = %self.identity, key, ?outcome, "delete property");
        self.transition(SessionState::Ready)?;
        Ok(outcome)
    }

    /// The payload a commit would write right now.
    pub fn writable_set(&self) -> Result<Map<String, Value>, SessionError> {
        let resolved = self.resolved.as_ref().ok_or(SessionError::NotReady(self.state))?;

        let mut payload = Map::new();
        for key in resolved.leaf_keys() {
            if self.deleted.contains(key) {
                continue;
            }
            if let Some(value) = resolved.leaf_value(key) {
                payload.insert(key.to_string(), value.clone());
            }
        }
        if let Some(parent) = resolved.leaf_inherits() {
            if !self.deleted.contains(INHERITS_KEY) {
                payload.insert(INHERITS_KEY.to_string(), Value::String(parent.to_string()));
            }
        }
        for (key, value) in &self.pending {
            payload.insert(key.clone(), value.clone());
        }
        Ok(payload)
    }

    /// Write the writable set back to the preset's own record.
    ///
    /// On failure nothing is cleared and the session waits in COMMIT_FAILED
    /// for [`acknowledge_failure`](Self::acknowledge_failure).
    pub fn commit(&mut self, resolver: &Resolver) -> Result<(), SessionError> {
        self.require_ready()?;
        let payload = self.writable_set()?;
        self.transition(SessionState::Committing)?;

        let written = resolver
            .locator()
            .store()
            .write_config(self.identity.path(), &payload)
            .map_err(StoreError::into_write_error);

        if let Err(e) = written {
            warn!(preset = %self.identity, error = %e, "commit failed");
            self.last_error = Some(e.clone());
            self.transition(SessionState::CommitFailed)?;
            return Err(SessionError::Write(e));
        }

        info!(
            preset = %self.identity,
            keys = payload.len(),
            edits = self.pending.len(),
            deletions = self.deleted.len(),
            "committed preset"
        );

        match resolver.resolve(&self.identity) {
            Ok(resolved) => self.resolved = Some(resolved),
            Err(e) => {
                warn!(preset = %self.identity, error = %e, "re-resolve after commit failed; patching locally");
                self.patch_resolved();
            }
        }
        self.pending.clear();
        self.deleted.clear();
        self.last_error = None;
        self.transition(SessionState::Ready)
    }

    /// Leave COMMIT_FAILED with pending edits intact.
    pub fn acknowledge_failure(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Ready)?;
        self.last_error = None;
        Ok(())
    }

    fn patch_resolved(&mut self) {
        let Some(resolved) = self.resolved.as_mut() else {
            return;
        };
        for key in &self.deleted {
            if key == INHERITS_KEY {
                resolved.set_leaf_property(INHERITS_KEY, Value::Null);
            } else {
                resolved.remove_leaf_property(key);
            }
        }
        for (key, value) in &self.pending {
            resolved.set_leaf_property(key, value.clone());
        }
    }

    fn require_ready(&self) -> Result<(), SessionError> {
        if self.state.accepts_edits() {
            Ok(())
        } else {
            Err(SessionError::NotReady(self.state))
        }
    }

    fn transition(&mut self, new_state: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(new_state) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: new_state,
            });
        }
        self.state = new_state;
        Ok(())
    }
}
