// RAG chat client entry point.
//
// Startup sequence:
// 1. Load config (env > config/chat.toml > defaults)
// 2. Initialize tracing (log to file, not terminal)
// 3. Create mpsc channels
// 4. Spawn app logic task (probes backend readiness once, then loops)
// 5. Run the TUI event loop (blocking until user quits)
// 6. Cleanup on exit

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use rag_chat::app;
use rag_chat::backend::{Backend, HttpBackend};
use rag_chat::config;
use rag_chat::session::ChatSession;
use rag_chat::tui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config. Config must come first: the log filter lives there.
    let config = config::load_config().context("failed to load configuration")?;

    // 2. Initialize tracing (log to file, not the terminal, which the TUI owns)
    init_tracing(&config.log_filter)?;
    info!("rag-chat starting up, backend at {}", config.base_url);

    // 3. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&config));
    let session = ChatSession::new();

    // 4. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(backend, cmd_rx, ui_tx, session).await {
            error!("Application loop error: {}", e);
        }
    });

    // 5. Run the TUI event loop (blocking until user quits)
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 6. Cleanup: wait for the app task to drain and exit (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("rag-chat shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing(filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("rag-chat.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
