// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (scrolling). Editing
// keys mutate the local pending-input mirror optimistically and emit a
// `SetInput` so the session's copy stays authoritative.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::protocol::{ReadinessState, UserCommand};

use super::ViewState;

/// Lines jumped by PageUp/PageDown.
const PAGE_SIZE: usize = 10;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to
/// the app orchestrator (input edits, submit, quit). Returns `None` when
/// the key press was handled locally (scrolling) or ignored.
///
/// Editing and submission are gated exactly like the session's own guards:
/// while the backend is not ready or a query is outstanding, the input bar
/// is inert. Scrolling and quitting always work.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // On Windows, crossterm emits both Press and Release events for each
    // physical keypress; ignoring non-Press events prevents double input.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately (escape hatch).
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    match key_event.code {
        // Transcript scrolling. Any upward movement leaves follow mode;
        // End snaps back to the newest turn.
        KeyCode::Up => {
            view_state.scroll_from_bottom = view_state.scroll_from_bottom.saturating_add(1);
            None
        }
        KeyCode::Down => {
            view_state.scroll_from_bottom = view_state.scroll_from_bottom.saturating_sub(1);
            None
        }
        KeyCode::PageUp => {
            view_state.scroll_from_bottom =
                view_state.scroll_from_bottom.saturating_add(PAGE_SIZE);
            None
        }
        KeyCode::PageDown => {
            view_state.scroll_from_bottom =
                view_state.scroll_from_bottom.saturating_sub(PAGE_SIZE);
            None
        }
        KeyCode::End => {
            view_state.scroll_from_bottom = 0;
            None
        }

        // Everything below edits or submits, which is gated while the
        // backend is unavailable or a query is outstanding.
        _ if !input_enabled(view_state) => None,

        KeyCode::Enter => Some(UserCommand::Submit),

        KeyCode::Char(c) => {
            view_state.snapshot.pending_input.push(c);
            Some(UserCommand::SetInput(view_state.snapshot.pending_input.clone()))
        }
        KeyCode::Backspace => {
            view_state.snapshot.pending_input.pop();
            Some(UserCommand::SetInput(view_state.snapshot.pending_input.clone()))
        }
        KeyCode::Esc => {
            view_state.snapshot.pending_input.clear();
            Some(UserCommand::SetInput(String::new()))
        }

        _ => None,
    }
}

/// Whether the input bar currently accepts edits and submissions.
pub fn input_enabled(view_state: &ViewState) -> bool {
    view_state.snapshot.readiness == ReadinessState::Ready && !view_state.snapshot.busy
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
