// Conversation session state machine.
//
// `ChatSession` owns the transcript, the busy flag, the readiness state,
// and the pending input line. It is mutated only by the app orchestrator in
// response to its own channel events; the TUI sees it exclusively through
// `snapshot()`. The busy gate enforces single-flight: at most one query is
// outstanding at any time, so transcript appends are deterministic and
// match submission order.

use tracing::{debug, info};

use crate::backend::{ProbeOutcome, QueryOutcome};
use crate::protocol::{ReadinessState, Role, SessionSnapshot, Turn};

// ---------------------------------------------------------------------------
// Canned copy
// ---------------------------------------------------------------------------

/// System turn seeded when the probe resolves `Ready`.
pub const READY_MESSAGE: &str = "Chatbot is ready. Ask me anything about your data.";

/// System turn seeded when the backend is still loading its vector store.
pub const STARTING_MESSAGE: &str = "Chatbot is starting up. Please wait a moment...";

/// System turn seeded when the health probe fails outright.
pub const UNREACHABLE_MESSAGE: &str =
    "Unable to connect to the chatbot. Please check that the backend server is running.";

/// Assistant turn appended when the query returns an error status or an
/// unparsable body. Deliberately distinct from `NETWORK_ERROR_MESSAGE` so
/// the two failure classes are observable.
pub const QUERY_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Assistant turn appended when the query never completed.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Error connecting to server. Please check your connection.";

// ---------------------------------------------------------------------------
// ChatSession
// ---------------------------------------------------------------------------

/// The conversation controller.
///
/// State machine: `Idle -> Submitting` on an accepted submit, `Submitting ->
/// Idle` on any of the three query outcomes. Re-entrant submits while
/// `Submitting` are rejected, never queued.
pub struct ChatSession {
    readiness: ReadinessState,
    transcript: Vec<Turn>,
    busy: bool,
    pending_input: String,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        ChatSession {
            readiness: ReadinessState::Unknown,
            transcript: Vec::new(),
            busy: false,
            pending_input: String::new(),
        }
    }

    // -- accessors ---------------------------------------------------------

    pub fn readiness(&self) -> ReadinessState {
        self.readiness
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// Read-only snapshot for the renderer.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            readiness: self.readiness,
            transcript: self.transcript.clone(),
            busy: self.busy,
            pending_input: self.pending_input.clone(),
        }
    }

    // -- probe -------------------------------------------------------------

    /// Mark the probe as in flight. No-op once readiness has resolved.
    pub fn begin_probe(&mut self) {
        if self.readiness == ReadinessState::Unknown {
            self.readiness = ReadinessState::Checking;
        }
    }

    /// Apply the one-shot probe result: resolve the readiness state and seed
    /// exactly one System turn describing it.
    ///
    /// Readiness resolution is terminal; a second call is ignored.
    pub fn apply_probe(&mut self, outcome: ProbeOutcome) {
        if self.readiness.is_resolved() {
            debug!(?outcome, "ignoring probe outcome after readiness resolved");
            return;
        }

        let (readiness, message) = match outcome {
            ProbeOutcome::Ready => (ReadinessState::Ready, READY_MESSAGE),
            ProbeOutcome::Loading => (ReadinessState::NotReady, STARTING_MESSAGE),
            ProbeOutcome::Unreachable => (ReadinessState::Unreachable, UNREACHABLE_MESSAGE),
        };

        info!(?readiness, "backend readiness resolved");
        self.readiness = readiness;
        self.transcript.push(Turn::now(Role::System, message));
    }

    // -- pending input -----------------------------------------------------

    pub fn set_pending_input(&mut self, text: String) {
        self.pending_input = text;
    }

    // -- submit protocol ---------------------------------------------------

    /// Try to accept a submission.
    ///
    /// Guards (in order): trimmed input must be non-empty, the session must
    /// not be busy, and readiness must be `Ready`. A guard failure is a
    /// no-op: nothing is appended, nothing is cleared, no error surfaces.
    ///
    /// On acceptance: appends the User turn, clears the pending input, sets
    /// busy, and returns the trimmed question for the caller to send. The
    /// pending input is cleared at acceptance time, regardless of how the
    /// backend call later resolves.
    #[must_use]
    pub fn submit(&mut self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            debug!("rejecting submission: empty after trim");
            return None;
        }
        if self.busy {
            debug!("rejecting submission: a query is already outstanding");
            return None;
        }
        if self.readiness != ReadinessState::Ready {
            debug!(readiness = ?self.readiness, "rejecting submission: backend not ready");
            return None;
        }

        let question = trimmed.to_string();
        self.transcript.push(Turn::now(Role::User, question.clone()));
        self.pending_input.clear();
        self.busy = true;

        info!(len = question.len(), "submission accepted");
        Some(question)
    }

    /// Resolve the outstanding query.
    ///
    /// Appends exactly one Assistant turn for each of the three outcomes and
    /// clears the busy flag as the final step on every path.
    pub fn resolve_query(&mut self, outcome: QueryOutcome) {
        let text = match outcome {
            QueryOutcome::Answer(answer) => {
                info!("query answered");
                answer
            }
            QueryOutcome::HttpError => {
                info!("query failed with an HTTP-level error");
                QUERY_ERROR_MESSAGE.to_string()
            }
            QueryOutcome::NetworkError => {
                info!("query failed with a network-level error");
                NETWORK_ERROR_MESSAGE.to_string()
            }
        };

        self.transcript.push(Turn::now(Role::Assistant, text));
        self.busy = false;
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
