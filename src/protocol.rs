// Shared message and state types.
//
// These types flow across the seams between the session state machine, the
// app orchestrator, and the TUI: the session exposes `SessionSnapshot` to
// the renderer, the TUI sends `UserCommand` to the orchestrator, and the
// orchestrator pushes `UiUpdate` back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Readiness
// ---------------------------------------------------------------------------

/// Backend readiness as resolved by the one-shot startup probe.
///
/// The probe resolves this exactly once per process: `Unknown` at
/// construction, `Checking` while the probe is in flight, then one of the
/// three terminal states. There is no re-probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    /// Initial state, before the probe has started.
    Unknown,
    /// Probe request is in flight.
    Checking,
    /// Backend reported its vector store as loaded; submissions are allowed.
    Ready,
    /// Backend responded but is still loading; submissions stay gated off.
    NotReady,
    /// Health check failed (error status, network failure, or bad body).
    Unreachable,
}

impl ReadinessState {
    /// Whether this state is a terminal probe resolution.
    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            ReadinessState::Ready | ReadinessState::NotReady | ReadinessState::Unreachable
        )
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Who spoke a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in the conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// When the turn was appended. Display-only; ordering semantics come
    /// from transcript insertion order, not from this field.
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn now(role: Role, text: impl Into<String>) -> Self {
        Turn {
            role,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer surface
// ---------------------------------------------------------------------------

/// Read-only view of the session for the renderer.
///
/// The TUI never mutates session state directly; it renders snapshots and
/// sends `UserCommand`s back through the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub readiness: ReadinessState,
    pub transcript: Vec<Turn>,
    pub busy: bool,
    pub pending_input: String,
}

/// Updates pushed from the app orchestrator to the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// Full session snapshot after a state change.
    Snapshot(Box<SessionSnapshot>),
}

/// Commands sent from the TUI to the app orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Replace the pending input line with the given text.
    SetInput(String),
    /// Submit the current pending input as a question.
    Submit,
    /// Shut down the application.
    Quit,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_states() {
        assert!(!ReadinessState::Unknown.is_resolved());
        assert!(!ReadinessState::Checking.is_resolved());
        assert!(ReadinessState::Ready.is_resolved());
        assert!(ReadinessState::NotReady.is_resolved());
        assert!(ReadinessState::Unreachable.is_resolved());
    }

    #[test]
    fn turn_now_captures_role_and_text() {
        let turn = Turn::now(Role::User, "what is X?");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.text, "what is X?");
    }

    #[test]
    fn turn_serializes_round_trip() {
        let turn = Turn::now(Role::Assistant, "X is Y");
        let json = serde_json::to_string(&turn).unwrap();
        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }
}
