//! The primary editor's snapshot wire format.
//!
//! Two accepted shapes:
//!
//! ```json
//! {"editors": [{"path": "...", "selections": [...], "active": true}, ...]}
//! {"activeEditor": {"path": "...", "cursors": [...]}}
//! ```
//!
//! The single-document `activeEditor` form is the legacy shape; its editor
//! is implicitly active. Per-editor selections come from `selections`
//! (preferred) or the legacy `cursors` list of point positions.

use serde::Deserialize;
use serde_json::Error as JsonError;

use super::{Position, Selection};

/// One open document in the primary editor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub path: String,

    /// When present, the actual path the hosted editor must open (the
    /// primary editor is operating on a proxy/scratch copy of the file).
    #[serde(default)]
    pub temporary_file_path: Option<String>,

    #[serde(default)]
    pub selections: Vec<Selection>,

    /// Legacy point-selection list, used when `selections` is absent.
    #[serde(default)]
    pub cursors: Vec<Position>,

    #[serde(default)]
    pub first_visible_line: u32,

    #[serde(default)]
    pub last_visible_line: u32,

    #[serde(default)]
    pub active: bool,
}

impl EditorState {
    /// The path the hosted editor must actually open.
    pub fn destination_path(&self) -> &str {
        self.temporary_file_path.as_deref().unwrap_or(&self.path)
    }

    /// Selections to apply: `selections` when present, else legacy
    /// `cursors` as point selections.
    pub fn effective_selections(&self) -> Vec<Selection> {
        if !self.selections.is_empty() {
            self.selections.clone()
        } else {
            self.cursors.iter().copied().map(Selection::caret).collect()
        }
    }
}

/// A full snapshot of the primary editor.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub editors: Vec<EditorState>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(default)]
    editors: Option<Vec<EditorState>>,
    #[serde(default)]
    active_editor: Option<EditorState>,
}

impl Snapshot {
    /// Parse a snapshot from its raw JSON payload.
    ///
    /// Enforces the at-most-one-active invariant: if several editors are
    /// marked active, only the first keeps the flag.
    pub fn parse(raw: &str) -> Result<Self, JsonError> {
        let raw: RawSnapshot = serde_json::from_str(raw)?;

        let mut editors = match (raw.editors, raw.active_editor) {
            (Some(editors), _) => editors,
            (None, Some(mut single)) => {
                single.active = true;
                vec![single]
            }
            (None, None) => Vec::new(),
        };

        let mut seen_active = false;
        for editor in &mut editors {
            if editor.active {
                if seen_active {
                    editor.active = false;
                } else {
                    seen_active = true;
                }
            }
        }

        Ok(Self { editors })
    }

    /// The editor marked active, if any.
    pub fn active_editor(&self) -> Option<&EditorState> {
        self.editors.iter().find(|e| e.active)
    }

    /// The editor decoration waits correlate on: the active one, falling
    /// back to the first.
    pub fn active_or_first(&self) -> Option<&EditorState> {
        self.active_editor().or_else(|| self.editors.first())
    }
}
