//! In-memory hosted editor.

use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

use super::{EditorHost, HostError};
use crate::state::Selection;
use crate::store::DocumentSource;

/// Built-in command: discard local modifications of the active document.
const CMD_REVERT: &str = "workbench.action.files.revert";

/// Built-in command: open a document (first argument is the path).
const CMD_OPEN: &str = "sidecar.open";

/// Handler for a registered hosted-editor command.
pub type CommandHandler = Box<dyn FnMut(&[Value]) -> Result<Value, HostError> + Send>;

/// One open document.
struct OpenDocument {
    path: String,
    text: String,
    selections: Vec<Selection>,
    first_visible_line: u32,
    last_visible_line: u32,
    dirty: bool,
}

/// The daemon's own hosted editor: a headless in-memory model.
///
/// Document text is resolved through the configured sources in order, so
/// an in-memory scratch document shadows the file of the same path on
/// disk. Opening a path no source knows still succeeds with empty text;
/// the primary editor may reference files that do not exist yet.
pub struct HeadlessHost {
    documents: Vec<OpenDocument>,
    active: Option<String>,
    sources: Vec<Arc<dyn DocumentSource>>,
    commands: FxHashMap<String, CommandHandler>,
}

impl HeadlessHost {
    pub fn new(sources: Vec<Arc<dyn DocumentSource>>) -> Self {
        Self {
            documents: Vec::new(),
            active: None,
            sources,
            commands: FxHashMap::default(),
        }
    }

    /// Register a command handler, making it invokable through
    /// `execute_command`. Domain engines (the proxied command vocabulary)
    /// attach themselves here.
    pub fn register_command(
        &mut self,
        id: impl Into<String>,
        handler: CommandHandler,
    ) -> &mut Self {
        self.commands.insert(id.into(), handler);
        self
    }

    /// Mark a document dirty (local modification), for tests and embedders.
    pub fn mark_dirty(&mut self, path: &str) -> Result<(), HostError> {
        let doc = self.document_mut(path)?;
        doc.dirty = true;
        Ok(())
    }

    fn resolve_text(&self, path: &str) -> String {
        self.sources
            .iter()
            .find_map(|s| s.read_document(path))
            .unwrap_or_default()
    }

    fn document(&self, path: &str) -> Option<&OpenDocument> {
        self.documents.iter().find(|d| d.path == path)
    }

    fn document_mut(&mut self, path: &str) -> Result<&mut OpenDocument, HostError> {
        self.documents
            .iter_mut()
            .find(|d| d.path == path)
            .ok_or_else(|| HostError::DocumentNotOpen(path.to_string()))
    }
}

impl EditorHost for HeadlessHost {
    fn open_paths(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.path.clone()).collect()
    }

    fn active_path(&self) -> Option<String> {
        self.active.clone()
    }

    fn open(&mut self, path: &str) -> Result<(), HostError> {
        if self.document(path).is_none() {
            let text = self.resolve_text(path);
            self.documents.push(OpenDocument {
                path: path.to_string(),
                text,
                selections: Vec::new(),
                first_visible_line: 0,
                last_visible_line: 0,
                dirty: false,
            });
        }
        // Showing an already-open document focuses it.
        self.active = Some(path.to_string());
        Ok(())
    }

    fn close_all(&mut self) -> Result<(), HostError> {
        self.documents.clear();
        self.active = None;
        Ok(())
    }

    fn is_dirty(&self, path: &str) -> bool {
        self.document(path).is_some_and(|d| d.dirty)
    }

    fn revert(&mut self, path: &str) -> Result<(), HostError> {
        let text = self.resolve_text(path);
        let doc = self.document_mut(path)?;
        doc.text = text;
        doc.dirty = false;
        Ok(())
    }

    fn set_selections(&mut self, path: &str, selections: Vec<Selection>) -> Result<(), HostError> {
        self.document_mut(path)?.selections = selections;
        Ok(())
    }

    fn set_visible_range(&mut self, path: &str, first: u32, last: u32) -> Result<(), HostError> {
        let doc = self.document_mut(path)?;
        doc.first_visible_line = first;
        doc.last_visible_line = last;
        Ok(())
    }

    fn focus(&mut self, path: &str) -> Result<(), HostError> {
        if self.document(path).is_none() {
            return Err(HostError::DocumentNotOpen(path.to_string()));
        }
        self.active = Some(path.to_string());
        Ok(())
    }

    fn selections(&self, path: &str) -> Vec<Selection> {
        self.document(path)
            .map(|d| d.selections.clone())
            .unwrap_or_default()
    }

    fn visible_range(&self, path: &str) -> (u32, u32) {
        self.document(path)
            .map(|d| (d.first_visible_line, d.last_visible_line))
            .unwrap_or((0, 0))
    }

    fn document_text(&self, path: &str) -> Option<String> {
        self.document(path).map(|d| d.text.clone())
    }

    fn execute_command(&mut self, id: &str, args: &[Value]) -> Result<Value, HostError> {
        match id {
            CMD_REVERT => {
                if let Some(active) = self.active.clone() {
                    self.revert(&active)?;
                }
                Ok(Value::Null)
            }
            CMD_OPEN => {
                let path = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| HostError::CommandFailed {
                        command: id.to_string(),
                        message: "expected a path argument".to_string(),
                    })?
                    .to_string();
                self.open(&path)?;
                Ok(Value::Null)
            }
            _ => match self.commands.get_mut(id) {
                Some(handler) => handler(args),
                None => Err(HostError::UnknownCommand(id.to_string())),
            },
        }
    }
}
