// Screen layout: panel arrangement and sizing.
//
// Divides the terminal area into fixed zones for the chat view:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Transcript (fill)                                 |
// |                                                   |
// +--------------------------------------------------+
// | Input Bar (3 rows, bordered)                      |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each chat zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: backend readiness and busy indicator.
    pub status_bar: Rect,
    /// Middle section: the scrolling conversation transcript.
    pub transcript: Rect,
    /// Bordered input line for composing a question.
    pub input_bar: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the chat layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    // Vertical: status(1) | transcript(fill) | input(3) | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(5),    // transcript
            Constraint::Length(3), // input bar (bordered)
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        transcript: vertical[1],
        input_bar: vertical[2],
        help_bar: vertical[3],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
