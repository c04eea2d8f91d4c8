//! Hosted editor abstraction.
//!
//! The hosted editor's native document/selection/view primitives are an
//! external collaborator; everything this daemon does to the hosted editor
//! goes through the [`EditorHost`] trait. The reconciliation engine drives
//! the trait and never touches host internals.
//!
//! - [`HeadlessHost`] - the concrete in-process implementation backing the
//!   daemon: an in-memory model of open documents, selections, visible
//!   ranges and focus, with document text resolved through pluggable
//!   [`DocumentSource`]s (in-memory scratch documents shadow disk)
//! - `recording` (test only) - a call-recording double used to assert the
//!   minimal-diff and idempotence properties

mod headless;
#[cfg(test)]
pub mod recording;

pub use headless::HeadlessHost;

use thiserror::Error;

use crate::state::Selection;

/// Errors surfaced by hosted-editor operations.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("document is not open: {0}")]
    DocumentNotOpen(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("command `{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("io error on `{0}`")]
    Io(String, #[source] std::io::Error),
}

/// Write/read access to the hosted editor.
///
/// Mutating operations return `Result` because the hosted editor can
/// refuse them (document gone, command rejected); those failures propagate
/// to the reconciliation caller.
pub trait EditorHost: Send {
    /// Paths of all currently open documents, in opening order.
    fn open_paths(&self) -> Vec<String>;

    /// Path of the focused document, if any.
    fn active_path(&self) -> Option<String>;

    /// Open (or show) a document.
    fn open(&mut self, path: &str) -> Result<(), HostError>;

    /// Close every open document.
    fn close_all(&mut self) -> Result<(), HostError>;

    /// Does the document have unsaved local modifications?
    fn is_dirty(&self, path: &str) -> bool;

    /// Discard local modifications, reloading from the backing source.
    fn revert(&mut self, path: &str) -> Result<(), HostError>;

    fn set_selections(&mut self, path: &str, selections: Vec<Selection>) -> Result<(), HostError>;

    fn set_visible_range(&mut self, path: &str, first: u32, last: u32) -> Result<(), HostError>;

    /// Move focus to the document.
    fn focus(&mut self, path: &str) -> Result<(), HostError>;

    /// Current selections of a document (empty when not open).
    fn selections(&self, path: &str) -> Vec<Selection>;

    /// Current visible range of a document.
    fn visible_range(&self, path: &str) -> (u32, u32);

    /// The document's current text, if open.
    fn document_text(&self, path: &str) -> Option<String>;

    /// Invoke a hosted-editor command by id with positional arguments.
    fn execute_command(
        &mut self,
        id: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value, HostError>;
}
