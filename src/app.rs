// App orchestration: the event loop that owns the ChatSession.
//
// Single-owner model: this task is the only code that mutates the session.
// It probes backend readiness once at startup, then loops over TUI commands
// and query resolutions, pushing a fresh `SessionSnapshot` to the TUI after
// every state change. Queries run in spawned tasks so the loop keeps
// servicing input while a call is in flight; the session's busy gate
// guarantees at most one such task exists at a time.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::backend::{Backend, QueryOutcome};
use crate::protocol::{UiUpdate, UserCommand};
use crate::session::ChatSession;

/// Push the current session snapshot to the TUI. Send failures mean the TUI
/// is gone; the main loop will notice the closed command channel and exit.
async fn push_snapshot(session: &ChatSession, ui_tx: &mpsc::Sender<UiUpdate>) {
    let _ = ui_tx
        .send(UiUpdate::Snapshot(Box::new(session.snapshot())))
        .await;
}

/// Run the app event loop until the TUI quits or its channel closes.
///
/// Startup performs the one-shot readiness probe before entering the loop:
/// there is no re-probing and no probe timeout, so an unresponsive backend
/// holds the session in `Checking` until the call completes.
pub async fn run(
    backend: Arc<dyn Backend>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut session: ChatSession,
) -> anyhow::Result<()> {
    info!("app event loop started");

    // One-shot readiness probe.
    session.begin_probe();
    push_snapshot(&session, &ui_tx).await;
    let probe = backend.probe_health().await;
    session.apply_probe(probe);
    push_snapshot(&session, &ui_tx).await;

    // Resolutions from the (at most one) in-flight query task.
    let (query_tx, mut query_rx) = mpsc::channel::<QueryOutcome>(8);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::SetInput(text)) => {
                        session.set_pending_input(text);
                        push_snapshot(&session, &ui_tx).await;
                    }
                    Some(UserCommand::Submit) => {
                        let raw = session.pending_input().to_owned();
                        if let Some(question) = session.submit(&raw) {
                            let backend = Arc::clone(&backend);
                            let tx = query_tx.clone();
                            tokio::spawn(async move {
                                let outcome = backend.send_query(&question).await;
                                if tx.send(outcome).await.is_err() {
                                    warn!("app loop gone before query resolved");
                                }
                            });
                        }
                        push_snapshot(&session, &ui_tx).await;
                    }
                    Some(UserCommand::Quit) => {
                        info!("quit command received, shutting down");
                        break;
                    }
                    None => {
                        // An issued submission always runs to completion and
                        // always clears busy, so drain the outstanding
                        // resolution before exiting.
                        info!("command channel closed, shutting down");
                        if session.busy() {
                            if let Some(outcome) = query_rx.recv().await {
                                session.resolve_query(outcome);
                                push_snapshot(&session, &ui_tx).await;
                            }
                        }
                        break;
                    }
                }
            }

            Some(outcome) = query_rx.recv() => {
                session.resolve_query(outcome);
                push_snapshot(&session, &ui_tx).await;
            }
        }
    }

    info!("app event loop exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
