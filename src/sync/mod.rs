//! Reconciliation: converging the hosted editor onto the primary
//! editor's snapshot.
//!
//! - `engine` - the diff-and-apply core with its idempotence guard
//! - `decorations` - bounded polling of the versioned decoration
//!   side-channel

pub mod decorations;
pub mod engine;

pub use decorations::{DecorationProvider, DiskDecorations, MemoryDecorations};
pub use engine::{ReconcileOutcome, SyncEngine, SyncError};
