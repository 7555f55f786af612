//! Edit session state machine
//!
//! UNINITIALIZED → LOADING → READY ⇄ COMMITTING, with COMMIT_FAILED held
//! until the failure is acknowledged. There is no terminal state; sessions
//! are simply dropped.

use serde::Serialize;

/// Edit session state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Created, nothing resolved yet
    Uninitialized,
    /// Resolving the preset
    Loading,
    /// Accepting edits
    Ready,
    /// Writing the commit payload
    Committing,
    /// The last write failed; pending edits are intact
    CommitFailed,
}

impl SessionState {
    /// Check if transition from this state to target is valid
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        match (self, target) {
            // From UNINITIALIZED
            (SessionState::Uninitialized, SessionState::Loading) => true,

            // From LOADING
            (SessionState::Loading, SessionState::Ready) => true,
            (SessionState::Loading, SessionState::Uninitialized) => true, // Resolution failed

            // From READY
            (SessionState::Ready, SessionState::Ready) => true, // Edits
            (SessionState::Ready, SessionState::Committing) => true,
            (SessionState::Ready, SessionState::Loading) => true, // Reload, dropping edits

            // From COMMITTING
            (SessionState::Committing, SessionState::Ready) => true,
            (SessionState::Committing, SessionState::CommitFailed) => true,

            // From COMMIT_FAILED
            (SessionState::CommitFailed, SessionState::Ready) => true, // Acknowledged

            _ => false,
        }
    }

    /// Whether edits may be applied in this state
    pub fn accepts_edits(&self) -> bool {
        matches!(self, SessionState::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(SessionState::Uninitialized.can_transition_to(SessionState::Loading));
        assert!(SessionState::Loading.can_transition_to(SessionState::Ready));
        assert!(SessionState::Ready.can_transition_to(SessionState::Ready));
        assert!(SessionState::Ready.can_transition_to(SessionState::Committing));
        assert!(SessionState::Committing.can_transition_to(SessionState::Ready));
    }

    #[test]
    fn test_failure_path_transitions() {
        assert!(SessionState::Committing.can_transition_to(SessionState::CommitFailed));
        assert!(SessionState::CommitFailed.can_transition_to(SessionState::Ready));
        assert!(!SessionState::CommitFailed.can_transition_to(SessionState::Committing));
        assert!(!SessionState::Uninitialized.can_transition_to(SessionState::Ready));
        assert!(!SessionState::Committing.can_transition_to(SessionState::Committing));
    }

    #[test]
    fn test_only_ready_accepts_edits() {
        assert!(SessionState::Ready.accepts_edits());
        assert!(!SessionState::CommitFailed.accepts_edits());
        assert!(!SessionState::Loading.accepts_edits());
    }
}
