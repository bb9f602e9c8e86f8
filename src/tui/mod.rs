// TUI chat view: layout, input handling, and rendering.
//
// The TUI owns a `ViewState` that mirrors the session snapshot. The app
// orchestrator pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them to `ViewState` and re-renders at ~30 fps. All session
// mutations travel the other way as `UserCommand`s.

pub mod input;
pub mod layout;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::protocol::{ReadinessState, Role, SessionSnapshot, UiUpdate, UserCommand};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state: the latest session snapshot plus scroll position.
pub struct ViewState {
    /// Latest snapshot from the app orchestrator.
    pub snapshot: SessionSnapshot,
    /// How many lines the transcript is scrolled up from the newest line.
    /// Zero means follow mode: the newest turn stays visible.
    pub scroll_from_bottom: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            snapshot: SessionSnapshot {
                readiness: ReadinessState::Unknown,
                transcript: Vec::new(),
                busy: false,
                pending_input: String::new(),
            },
            scroll_from_bottom: 0,
        }
    }
}

/// Apply a single UiUpdate to the ViewState.
///
/// A snapshot that grew the transcript snaps the view back to the newest
/// turn, mirroring the scroll-to-bottom behavior users expect from a chat.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => {
            if snapshot.transcript.len() > state.snapshot.transcript.len() {
                state.scroll_from_bottom = 0;
            }
            state.snapshot = *snapshot;
        }
    }
}

// ---------------------------------------------------------------------------
// Text wrapping
// ---------------------------------------------------------------------------

/// Word-wrap `text` to `width` columns, preserving explicit newlines.
/// Words longer than the width are hard-split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw_line in text.split('\n') {
        let mut current = String::new();
        for mut word in raw_line.split_whitespace() {
            while word.chars().count() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let head: String = word.chars().take(width).collect();
                word = &word[head.len()..];
                lines.push(head);
            }
            if current.is_empty() {
                current.push_str(word);
            } else if current.chars().count() + 1 + word.chars().count() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }

    lines
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn role_span(role: Role) -> Span<'static> {
    match role {
        Role::System => Span::styled("system", Style::default().fg(Color::Yellow)),
        Role::User => Span::styled(
            "you",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Role::Assistant => Span::styled(
            "assistant",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
    }
}

/// Build the transcript lines at the given inner width. Each turn renders
/// as a timestamped header line followed by wrapped body lines, with a
/// blank separator; a dim thinking row is appended while a query is
/// outstanding.
fn build_transcript_lines(snapshot: &SessionSnapshot, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for turn in &snapshot.transcript {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", turn.at.format("%H:%M")),
                Style::default().add_modifier(Modifier::DIM),
            ),
            role_span(turn.role),
        ]));
        for body_line in wrap_text(&turn.text, width) {
            lines.push(Line::from(body_line));
        }
        lines.push(Line::from(""));
    }

    if snapshot.busy {
        lines.push(Line::from(Span::styled(
            "assistant is thinking...",
            Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
        )));
    }

    lines
}

/// Human-readable status line for the header bar.
fn status_text(snapshot: &SessionSnapshot) -> (&'static str, Color) {
    if snapshot.busy {
        return ("Thinking...", Color::Magenta);
    }
    match snapshot.readiness {
        ReadinessState::Unknown | ReadinessState::Checking => {
            ("Checking chatbot status...", Color::Yellow)
        }
        ReadinessState::Ready => ("Ready to answer questions", Color::Green),
        ReadinessState::NotReady => ("Loading data, please wait...", Color::Yellow),
        ReadinessState::Unreachable => ("Backend unreachable", Color::Red),
    }
}

/// Placeholder shown in the empty input bar, mirroring the gating state.
fn input_placeholder(snapshot: &SessionSnapshot) -> &'static str {
    if snapshot.busy {
        "Waiting for answer..."
    } else if snapshot.readiness == ReadinessState::Ready {
        "Ask a question about your data..."
    } else {
        "Waiting for chatbot to load..."
    }
}

fn render_status_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let (status, color) = status_text(&state.snapshot);
    let paragraph = Paragraph::new(Line::from(vec![
        Span::styled(
            " rag-chat ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("| "),
        Span::styled(status, Style::default().fg(color)),
    ]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.status_bar);
}

fn render_transcript(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Conversation");
    let inner = block.inner(layout.transcript);

    let lines = build_transcript_lines(&state.snapshot, inner.width as usize);
    let total = lines.len();
    let visible = inner.height as usize;

    // Follow mode keeps the newest line in view; scrolling up moves the
    // window back through history, clamped to the start.
    let max_offset = total.saturating_sub(visible);
    let offset = max_offset.saturating_sub(state.scroll_from_bottom.min(max_offset));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((offset as u16, 0));
    frame.render_widget(paragraph, layout.transcript);
}

fn render_input_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let enabled = input_enabled_style(state);
    let content = if state.snapshot.pending_input.is_empty() {
        Span::styled(
            input_placeholder(&state.snapshot),
            Style::default().add_modifier(Modifier::DIM),
        )
    } else {
        Span::raw(state.snapshot.pending_input.clone())
    };

    let paragraph = Paragraph::new(Line::from(content)).style(enabled).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Your question"),
    );
    frame.render_widget(paragraph, layout.input_bar);

    if input::input_enabled(state) {
        let cursor_x = layout.input_bar.x
            + 1
            + state.snapshot.pending_input.chars().count() as u16;
        let cursor_y = layout.input_bar.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

fn input_enabled_style(state: &ViewState) -> Style {
    if input::input_enabled(state) {
        Style::default()
    } else {
        Style::default().add_modifier(Modifier::DIM)
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout) {
    let text = " Enter:Send | Esc:Clear | Up/Down PgUp/PgDn:Scroll | End:Newest | Ctrl+C:Quit";
    let paragraph = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    )))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

/// Render the complete chat frame.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    render_status_bar(frame, &layout, state);
    render_transcript(frame, &layout, state);
    render_input_bar(frame, &layout, state);
    render_help_bar(frame, &layout);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => {
                        apply_ui_update(&mut view_state, ui_update);
                    }
                    None => {
                        // Channel closed: app is shutting down.
                        break;
                    }
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse events, resize events, etc. -- the render
                        // tick picks up the new size automatically.
                    }
                    Some(Err(_)) | None => {
                        break;
                    }
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
