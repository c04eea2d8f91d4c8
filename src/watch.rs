//! Snapshot file watcher.
//!
//! Watches the root directory and triggers reconciliation when the
//! primary editor rewrites its state file. Events are debounced (editors
//! write in bursts, often via write-then-rename) and filtered down to
//! state files, so the daemon's own artifacts (nonce, socket, `*.out`
//! dumps, flag files) never feed back into the loop.
//!
//! Architecture:
//! ```text
//! Watcher → Debouncer (pure timing) → trigger channel → sync task
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::server::Context;
use crate::{debug, log};

/// Check if path is a temp/backup file (editor artifacts)
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Does this path look like a primary-editor state file?
///
/// The primary editor writes `editor-state.json`; the suffix match also
/// picks up the per-instance variants some setups write. Everything else
/// under the root directory is daemon-owned output.
fn is_state_file(path: &Path) -> bool {
    if is_temp_file(path) {
        return false;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.ends_with("-state.json"))
}

/// Watcher actor: turns raw notify events into debounced reconcile
/// triggers.
pub struct WatchActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    /// Channel to the sync task
    sync_tx: mpsc::Sender<()>,
    debouncer: Debouncer,
}

impl WatchActor {
    /// Start watching the root directory. The watcher is live immediately,
    /// buffering events until `run` is awaited, so a state write during
    /// startup is never lost.
    pub fn new(root: &Path, sync_tx: mpsc::Sender<()>, debounce: Duration) -> notify::Result<Self> {
        // notify's callback API is sync; bridge into the async loop.
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher.watch(root, RecursiveMode::NonRecursive)?;

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            sync_tx,
            debouncer: Debouncer::new(debounce),
        })
    }

    /// Run the actor event loop.
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let sync_tx = self.sync_tx;
        let mut debouncer = self.debouncer;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    if debouncer.take_if_ready() {
                        debug!("watch"; "state file changed, triggering sync");
                        if sync_tx.send(()).await.is_err() {
                            break; // Sync task shut down
                        }
                    }
                }
            }
        }
    }
}

/// Spawn the sync task: each trigger runs one reconciliation against the
/// disk snapshot. Failures are logged and never take the task down; the
/// next trigger simply retries from the current snapshot.
pub fn spawn_sync_task(ctx: Context) -> mpsc::Sender<()> {
    let (sync_tx, mut sync_rx) = mpsc::channel::<()>(16);

    tokio::spawn(async move {
        while sync_rx.recv().await.is_some() {
            reconcile_once(&ctx).await;
        }
    });

    sync_tx
}

/// One reconciliation pass against the disk snapshot, errors logged.
pub async fn reconcile_once(ctx: &Context) {
    match ctx.reconcile_from(ctx.disk.as_ref()).await {
        Ok(outcome) => debug!("sync"; "{:?}", outcome),
        Err(e) => log!("sync"; "reconcile failed: {}", e),
    }
}

// =============================================================================
// Debouncer - Pure timing
// =============================================================================

/// Pure debouncer: coalesces event bursts into one trigger once the
/// window goes quiet.
struct Debouncer {
    pending: Vec<PathBuf>,
    last_event: Option<Instant>,
    window: Duration,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            pending: Vec::new(),
            last_event: None,
            window,
        }
    }

    fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        // Metadata-only changes (mtime/chmod noise) never carry new state.
        if matches!(
            event.kind,
            EventKind::Modify(notify::event::ModifyKind::Metadata(_))
        ) {
            return;
        }
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return;
        }

        for path in &event.paths {
            if !is_state_file(path) {
                continue;
            }
            debug!("watch"; "event: {}", path.display());
            if !self.pending.contains(path) {
                self.pending.push(path.clone());
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Consume the pending burst if the debounce window elapsed.
    fn take_if_ready(&mut self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < self.window || self.pending.is_empty() {
            return false;
        }

        self.pending.clear();
        self.last_event = None;
        true
    }

    /// Precise sleep duration until next possible ready time.
    fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}
