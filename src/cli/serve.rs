//! The `serve` subcommand: daemon lifecycle.
//!
//! The main thread owns the blocking HTTP request loop; a background
//! thread owns a tokio runtime running the async side (socket listener,
//! snapshot watcher, sync task). Ctrl+C unblocks the request loop and
//! signals the runtime thread through the shutdown channel registered in
//! `core`.

use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context as _, Result};
use crossbeam::channel;

use crate::config::{SidecarConfig, cfg};
use crate::server::{Context, Nonce, http};
use crate::{log, watch};

pub fn run() -> Result<()> {
    let config = cfg();
    std::fs::create_dir_all(&config.root)
        .with_context(|| format!("failed to create root directory {}", config.root.display()))?;

    let (server, addr) = http::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    let nonce = Arc::new(Nonce::generate());
    nonce.persist(&config.nonce_path())?;

    let ctx = Context::new(Arc::clone(&config));

    log!("serve"; "http://{}", addr);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    let handle = rt.handle().clone();

    let async_handle = spawn_async_side(rt, ctx.clone(), Arc::clone(&config), shutdown_rx);

    http::run_request_loop(&server, ctx, nonce, handle);

    wait_for_shutdown(async_handle);
    cleanup(&config);
    Ok(())
}

/// Run the async side on its own runtime thread: initial reconcile,
/// socket listener, snapshot watcher and sync task. Parks until the
/// shutdown channel fires.
fn spawn_async_side(
    rt: tokio::runtime::Runtime,
    ctx: Context,
    config: Arc<SidecarConfig>,
    shutdown_rx: channel::Receiver<()>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        rt.block_on(async move {
            // Converge onto whatever snapshot is already on disk before
            // accepting triggers.
            watch::reconcile_once(&ctx).await;

            #[cfg(unix)]
            {
                let socket_path = config.socket_path();
                match crate::server::socket::bind(&socket_path) {
                    Ok(listener) => {
                        tokio::spawn(crate::server::socket::run(
                            listener,
                            socket_path,
                            ctx.clone(),
                        ));
                    }
                    Err(e) => log!("socket"; "{:#}", e),
                }
            }

            let sync_tx = watch::spawn_sync_task(ctx.clone());
            match watch::WatchActor::new(&config.root, sync_tx, config.debounce()) {
                Ok(actor) => {
                    tokio::spawn(actor.run());
                }
                Err(e) => log!("watch"; "failed to start watcher: {}", e),
            }

            // Park until shutdown; the runtime (and its tasks) drops on return.
            let _ = tokio::task::spawn_blocking(move || {
                let _ = shutdown_rx.recv();
            })
            .await;
        });
    })
}

/// Wait for the async side to shut down gracefully (max 2 seconds).
fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
}

/// Remove the per-run artifacts so a stale nonce or socket file never
/// outlives the daemon.
fn cleanup(config: &SidecarConfig) {
    let _ = std::fs::remove_file(config.nonce_path());
    #[cfg(unix)]
    let _ = std::fs::remove_file(config.socket_path());
}
