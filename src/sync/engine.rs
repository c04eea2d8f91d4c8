//! The reconciliation core.
//!
//! Given the primary editor's snapshot, drive the hosted editor to match:
//! same open documents, same selections, same visible ranges, same focus.
//! The engine never opens or closes more than it has to, never reacts to
//! a payload it already applied, and always records the payload it
//! attempted so a failing input is not retried in a hot loop.

use rustc_hash::FxHashSet;
use std::io;
use thiserror::Error;

use crate::flags::Flags;
use crate::host::{EditorHost, HostError};
use crate::state::Snapshot;
use crate::store::SnapshotStore;
use crate::sync::decorations::{DecorationProvider, token_for};
use crate::utils::normalize_path_str;

/// Errors from a reconciliation attempt.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read snapshot")]
    Read(#[source] io::Error),

    #[error("malformed snapshot payload")]
    Parse(#[source] serde_json::Error),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// What a reconciliation attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The master flag is off; nothing was touched.
    Disabled,

    /// The payload was byte-identical to the last applied one; nothing
    /// was touched.
    Unchanged,

    /// The hosted editor was converged onto the snapshot.
    Applied {
        /// Destination path of the document decorations are awaited on
        /// (the active document), when the snapshot had one.
        target: Option<String>,

        /// The target document's decoration version identifier as read
        /// *before* the apply - the correlation token for the decoration
        /// wait loop.
        previous_version: Option<String>,
    },
}

/// The reconciliation engine.
///
/// Owns the last-applied payload as an instance field, so independent
/// engines (tests, multiple sessions) never interfere.
#[derive(Default)]
pub struct SyncEngine {
    last_applied: Option<String>,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converge the hosted editor onto the store's current snapshot.
    ///
    /// The raw payload is recorded as last-applied on every attempt,
    /// success or failure, so a snapshot the host cannot apply is not
    /// retried indefinitely against unchanged input.
    pub fn reconcile(
        &mut self,
        host: &mut dyn EditorHost,
        store: &dyn SnapshotStore,
        flags: &Flags,
        decorations: &dyn DecorationProvider,
    ) -> Result<ReconcileOutcome, SyncError> {
        if !flags.sync_enabled() {
            return Ok(ReconcileOutcome::Disabled);
        }

        let raw = store.read_snapshot().map_err(SyncError::Read)?;

        // Idempotence guard: re-delivering the same payload never
        // re-triggers editor churn.
        if self.last_applied.as_deref() == Some(raw.as_str()) {
            return Ok(ReconcileOutcome::Unchanged);
        }

        let result = apply(&raw, host, flags, decorations);
        self.last_applied = Some(raw);
        result
    }
}

fn apply(
    raw: &str,
    host: &mut dyn EditorHost,
    flags: &Flags,
    decorations: &dyn DecorationProvider,
) -> Result<ReconcileOutcome, SyncError> {
    let snapshot = Snapshot::parse(raw).map_err(SyncError::Parse)?;

    // Normalized destination per editor, used as the single key for the
    // window diff AND every per-document host call. The snapshot may
    // spell an already-open document differently (relative segments,
    // symlinks); keying some calls by the raw string would make them
    // miss the host's document.
    let dests: Vec<String> = snapshot
        .editors
        .iter()
        .map(|e| {
            normalize_path_str(e.destination_path())
                .to_string_lossy()
                .into_owned()
        })
        .collect();

    let active_index = snapshot.editors.iter().position(|e| e.active);
    let target = active_index
        .or_else(|| (!snapshot.editors.is_empty()).then_some(0))
        .map(|i| dests[i].clone());

    let previous_version = match (&target, decorations.current()) {
        (Some(target), Ok(tokens)) => {
            token_for(&tokens, target).map(|t| t.version_identifier)
        }
        _ => None,
    };

    // Visible-window diff: identical destination sets are updated in
    // place (no flicker, undo history and scroll momentum survive);
    // anything else closes every window and reopens the snapshot's.
    let destinations: FxHashSet<String> = dests.iter().cloned().collect();
    let open: FxHashSet<String> = host
        .open_paths()
        .iter()
        .map(|p| normalize_path_str(p).to_string_lossy().into_owned())
        .collect();

    if destinations != open {
        host.close_all()?;
        for dest in &dests {
            host.open(dest)?;
        }
    }

    let scrolling = flags.scrolling_enabled();
    for (dest, editor) in dests.iter().zip(&snapshot.editors) {
        // The hosted copy always yields to the primary editor's copy;
        // unsaved local modifications would make every later command fail.
        if host.is_dirty(dest) {
            host.revert(dest)?;
        }

        if scrolling {
            host.set_visible_range(dest, editor.first_visible_line, editor.last_visible_line)?;
        }

        host.set_selections(dest, editor.effective_selections())?;
    }

    if let Some(i) = active_index {
        host.focus(&dests[i])?;
    }

    Ok(ReconcileOutcome::Applied {
        target,
        previous_version,
    })
}
