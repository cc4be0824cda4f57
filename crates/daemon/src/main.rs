// SPDX-License-Identifier: MIT

//! eld: the Elemental daemon binary.

use el_daemon::http::{router, AppState};
use el_daemon::lifecycle::{self, DaemonLock};
use el_daemon::session::SessionManager;
use el_daemon::{config::Config, env, ticks};
use el_engine::{Engine, WorktreeConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

fn main() -> std::process::ExitCode {
    let root = env::workspace_root();
    let state_dir = env::state_dir(&root);
    let _log_guard = lifecycle::init_tracing(&state_dir, &env::log_filter());

    match run(root, state_dir) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "daemon failed");
            eprintln!("eld: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn run(root: std::path::PathBuf, state_dir: std::path::PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(Config::load(&state_dir)?);
    let _lock = DaemonLock::acquire(&state_dir)?;

    // Store → engine (cache rebuild) → sessions → HTTP, in that order.
    let engine = Arc::new(Engine::open(
        &state_dir.join("store"),
        WorktreeConfig::new(root.clone()),
    )?);
    engine.ensure_system_entity()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(root, engine, config))
}

async fn serve(
    root: std::path::PathBuf,
    engine: Arc<Engine>,
    config: Arc<Config>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = engine.init_workspace().await {
        // A missing repo degrades worktree features only; the element API
        // still runs.
        warn!(root = %root.display(), error = %e, "workspace init incomplete");
    }

    let sessions = SessionManager::new(Arc::clone(&engine), config.session_settings());

    let cancel = CancellationToken::new();
    ticks::spawn(Arc::clone(&engine), &config, cancel.clone());

    let state = AppState {
        engine: Arc::clone(&engine),
        sessions: Arc::clone(&sessions),
        config: Arc::clone(&config),
    };
    let app = router(state);

    let addr = format!("{}:{}", config.http.bind, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, root = %root.display(), "eld listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(lifecycle::shutdown_signal())
        .await?;

    info!("shutting down");
    sessions.stop_all().await;
    cancel.cancel();
    if let Err(e) = engine.snapshot_now() {
        warn!(error = %e, "final snapshot failed");
    }
    Ok(())
}
