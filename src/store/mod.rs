//! Snapshot sources: where the primary editor's state is read from.
//!
//! One interface, two implementations, selected by call site:
//! - [`DiskStore`] - the real filesystem under the root directory; the
//!   primary editor writes `editor-state.json` there and a watcher
//!   triggers reconciliation
//! - [`MemoryStore`] - an in-memory virtual filesystem used by headless
//!   test/integration sessions (`updateEditorState` pushes a snapshot and
//!   optional document content directly over the wire)
//!
//! The snapshot is read as a raw string so the engine can run its
//! byte-equality idempotence check before parsing anything.

use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// File name of the primary editor's snapshot under the root directory.
pub const EDITOR_STATE_FILE: &str = "editor-state.json";

/// Read access to document text by path.
///
/// The hosted editor resolves document contents through a list of these,
/// so in-memory scratch documents shadow the real filesystem.
pub trait DocumentSource: Send + Sync {
    /// The document's text, if this source knows the path.
    fn read_document(&self, path: &str) -> Option<String>;
}

/// A place the primary editor's snapshot lives.
pub trait SnapshotStore: DocumentSource {
    /// Raw bytes of the current snapshot payload.
    fn read_snapshot(&self) -> io::Result<String>;

    /// Replace the store's entire contents with a new snapshot and an
    /// optional single document. Existing entries are deleted first so
    /// stale documents never linger between unrelated updates.
    fn replace(&self, snapshot: String, document: Option<(String, String)>) -> io::Result<()>;
}

// =============================================================================
// Disk store
// =============================================================================

/// Snapshot store backed by the real filesystem.
pub struct DiskStore {
    state_path: PathBuf,
}

impl DiskStore {
    pub fn new(root: &Path) -> Self {
        Self {
            state_path: root.join(EDITOR_STATE_FILE),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }
}

impl DocumentSource for DiskStore {
    fn read_document(&self, path: &str) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

impl SnapshotStore for DiskStore {
    fn read_snapshot(&self) -> io::Result<String> {
        std::fs::read_to_string(&self.state_path)
    }

    fn replace(&self, snapshot: String, document: Option<(String, String)>) -> io::Result<()> {
        std::fs::write(&self.state_path, snapshot)?;
        if let Some((path, content)) = document {
            std::fs::write(path, content)?;
        }
        Ok(())
    }
}

// =============================================================================
// Memory store
// =============================================================================

#[derive(Default)]
struct MemoryInner {
    snapshot: Option<String>,
    documents: FxHashMap<String, String>,
}

/// Snapshot store backed by an in-memory map, shared across all
/// `updateEditorState` calls.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentSource for MemoryStore {
    fn read_document(&self, path: &str) -> Option<String> {
        self.inner.lock().documents.get(path).cloned()
    }
}

impl SnapshotStore for MemoryStore {
    fn read_snapshot(&self) -> io::Result<String> {
        self.inner
            .lock()
            .snapshot
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no snapshot written yet"))
    }

    fn replace(&self, snapshot: String, document: Option<(String, String)>) -> io::Result<()> {
        let mut inner = self.inner.lock();
        inner.documents.clear();
        inner.snapshot = Some(snapshot);
        if let Some((path, content)) = document {
            inner.documents.insert(path, content);
        }
        Ok(())
    }
}
