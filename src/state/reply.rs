//! The hosted editor's serialized reply format.
//!
//! Returned by the `state` / `stateWithContents` commands and embedded in
//! `cursorless` replies. Carries the multi-document form plus the legacy
//! top-level `path`/`cursors` of the active document, so older clients
//! that only understand the degenerate single-document shape keep working.

use serde::Serialize;

use super::Selection;

/// One open document in the hosted editor, as serialized for clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorReply {
    pub path: String,
    pub selections: Vec<Selection>,
    pub first_visible_line: u32,
    pub last_visible_line: u32,
    pub active: bool,
}

/// A full snapshot of the hosted editor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSnapshot {
    /// Legacy: path of the active document.
    pub path: Option<String>,

    /// Legacy: selections of the active document.
    pub cursors: Vec<Selection>,

    /// Where the active document's text was written, when contents were
    /// requested (`<path>.out`).
    pub contents_path: Option<String>,

    pub editors: Vec<EditorReply>,
}

impl HostSnapshot {
    /// Build the snapshot, deriving the legacy top-level fields from the
    /// active editor.
    pub fn new(editors: Vec<EditorReply>, contents_path: Option<String>) -> Self {
        let active = editors.iter().find(|e| e.active);
        Self {
            path: active.map(|e| e.path.clone()),
            cursors: active.map(|e| e.selections.clone()).unwrap_or_default(),
            contents_path,
            editors,
        }
    }
}
