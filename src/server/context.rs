//! Shared state the command handlers dispatch against.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::SidecarConfig;
use crate::flags::Flags;
use crate::host::{EditorHost, HeadlessHost};
use crate::store::{DiskStore, DocumentSource, MemoryStore, SnapshotStore};
use crate::sync::{DecorationProvider, DiskDecorations, ReconcileOutcome, SyncEngine, SyncError};

/// The hosted editor plus the engine that drives it.
///
/// Guarded by one async mutex: the original design relied on cooperative
/// single-threaded scheduling for ordering; under preemptive tasks the
/// whole reconcile operation must be one mutual-exclusion region.
pub struct Mirror {
    pub host: Box<dyn EditorHost>,
    pub engine: SyncEngine,
}

/// Everything a command handler can reach.
#[derive(Clone)]
pub struct Context {
    pub mirror: Arc<Mutex<Mirror>>,
    pub disk: Arc<DiskStore>,
    pub memory: Arc<MemoryStore>,
    pub decorations: Arc<dyn DecorationProvider>,
    pub flags: Flags,
    pub config: Arc<SidecarConfig>,
}

impl Context {
    /// Production wiring: disk-backed snapshot store and decorations,
    /// headless host resolving document text memory-first.
    pub fn new(config: Arc<SidecarConfig>) -> Self {
        let disk = Arc::new(DiskStore::new(&config.root));
        let memory = Arc::new(MemoryStore::new());
        let sources: Vec<Arc<dyn DocumentSource>> = vec![memory.clone(), disk.clone()];
        let host = HeadlessHost::new(sources);

        Self {
            mirror: Arc::new(Mutex::new(Mirror {
                host: Box::new(host),
                engine: SyncEngine::new(),
            })),
            disk,
            memory,
            decorations: Arc::new(DiskDecorations::new(&config.root)),
            flags: Flags::new(&config.root),
            config,
        }
    }

    /// Run one reconciliation against `store`, holding the mirror lock
    /// for the whole operation.
    pub async fn reconcile_from(
        &self,
        store: &dyn SnapshotStore,
    ) -> Result<ReconcileOutcome, SyncError> {
        let mut mirror = self.mirror.lock().await;
        let Mirror { host, engine } = &mut *mirror;
        engine.reconcile(host.as_mut(), store, &self.flags, self.decorations.as_ref())
    }
}
