//! Call-recording hosted editor for tests.
//!
//! Wraps a [`HeadlessHost`] and records every structural operation so
//! tests can assert how many open/close/focus calls a reconciliation
//! actually performed.

use serde_json::Value;
use std::sync::Arc;

use super::{EditorHost, HeadlessHost, HostError};
use crate::state::Selection;
use crate::store::DocumentSource;

/// One recorded hosted-editor operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Open(String),
    CloseAll,
    Revert(String),
    SetSelections(String),
    SetVisibleRange(String, u32, u32),
    Focus(String),
    ExecuteCommand(String),
}

/// A hosted editor that records every call it receives.
pub struct RecordingHost {
    inner: HeadlessHost,
    pub calls: Vec<HostCall>,
}

impl RecordingHost {
    pub fn new(sources: Vec<Arc<dyn DocumentSource>>) -> Self {
        Self {
            inner: HeadlessHost::new(sources),
            calls: Vec::new(),
        }
    }

    pub fn inner_mut(&mut self) -> &mut HeadlessHost {
        &mut self.inner
    }

    /// Count of calls that open, close or focus documents (the operations
    /// the minimal-diff and idempotence properties are stated over).
    pub fn structural_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HostCall::Open(_) | HostCall::CloseAll | HostCall::Focus(_)))
            .count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl EditorHost for RecordingHost {
    fn open_paths(&self) -> Vec<String> {
        self.inner.open_paths()
    }

    fn active_path(&self) -> Option<String> {
        self.inner.active_path()
    }

    fn open(&mut self, path: &str) -> Result<(), HostError> {
        self.calls.push(HostCall::Open(path.to_string()));
        self.inner.open(path)
    }

    fn close_all(&mut self) -> Result<(), HostError> {
        self.calls.push(HostCall::CloseAll);
        self.inner.close_all()
    }

    fn is_dirty(&self, path: &str) -> bool {
        self.inner.is_dirty(path)
    }

    fn revert(&mut self, path: &str) -> Result<(), HostError> {
        self.calls.push(HostCall::Revert(path.to_string()));
        self.inner.revert(path)
    }

    fn set_selections(&mut self, path: &str, selections: Vec<Selection>) -> Result<(), HostError> {
        self.calls.push(HostCall::SetSelections(path.to_string()));
        self.inner.set_selections(path, selections)
    }

    fn set_visible_range(&mut self, path: &str, first: u32, last: u32) -> Result<(), HostError> {
        self.calls
            .push(HostCall::SetVisibleRange(path.to_string(), first, last));
        self.inner.set_visible_range(path, first, last)
    }

    fn focus(&mut self, path: &str) -> Result<(), HostError> {
        self.calls.push(HostCall::Focus(path.to_string()));
        self.inner.focus(path)
    }

    fn selections(&self, path: &str) -> Vec<Selection> {
        self.inner.selections(path)
    }

    fn visible_range(&self, path: &str) -> (u32, u32) {
        self.inner.visible_range(path)
    }

    fn document_text(&self, path: &str) -> Option<String> {
        self.inner.document_text(path)
    }

    fn execute_command(&mut self, id: &str, args: &[Value]) -> Result<Value, HostError> {
        self.calls.push(HostCall::ExecuteCommand(id.to_string()));
        self.inner.execute_command(id, args)
    }
}
