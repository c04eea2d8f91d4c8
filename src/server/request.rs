//! The control-plane request union and its parse boundary.
//!
//! Requests are a tagged union keyed by `command`; each variant carries
//! only the fields that command uses. Malformed payloads are rejected
//! here, before dispatch, so handlers never see half-formed requests.
//! An unrecognized command is not an error condition: it maps to the
//! structured `invalid command` reply.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Parse failures at the request boundary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed request: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("request is not a JSON object")]
    NotAnObject,

    #[error("missing command field")]
    MissingCommand,

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("bad payload for `{command}`: {source}")]
    BadPayload {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A parsed control-plane request.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PendingCommandRequest {
    /// Liveness probe.
    Ping,

    /// Snapshot the hosted editor (no document contents).
    State,

    /// Snapshot plus the active document's text written to `<path>.out`.
    StateWithContents,

    /// Trigger reconciliation from the disk snapshot; fire-and-forget.
    ApplyPrimaryEditorState,

    /// Push a snapshot (and optionally one document's content) into the
    /// in-memory store, reconcile from it, then await a decoration change.
    #[serde(rename_all = "camelCase")]
    UpdateEditorState {
        /// Raw snapshot JSON payload.
        state: String,
        #[serde(default)]
        file: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },

    /// Invoke an arbitrary hosted-editor command by id.
    #[serde(rename_all = "camelCase")]
    Command {
        command_id: String,
        #[serde(default)]
        command_args: Vec<Value>,
    },

    /// Current decoration set plus current selections.
    Hats,

    /// Invoke one domain command, capturing before/after state.
    #[serde(rename_all = "camelCase")]
    Cursorless {
        /// Domain command arguments, JSON-encoded as a string (the
        /// calling side wraps them to keep its own serialization simple).
        cursorless_args: String,
    },

    /// Process identifier.
    Pid,
}

impl PendingCommandRequest {
    /// The wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::State => "state",
            Self::StateWithContents => "stateWithContents",
            Self::ApplyPrimaryEditorState => "applyPrimaryEditorState",
            Self::UpdateEditorState { .. } => "updateEditorState",
            Self::Command { .. } => "command",
            Self::Hats => "hats",
            Self::Cursorless { .. } => "cursorless",
            Self::Pid => "pid",
        }
    }
}

/// Is this a command the dispatch table knows?
fn is_known(command: &str) -> bool {
    matches!(
        command,
        "ping"
            | "state"
            | "stateWithContents"
            | "applyPrimaryEditorState"
            | "updateEditorState"
            | "command"
            | "hats"
            | "cursorless"
            | "pid"
    )
}

/// Parse a request that already made it through JSON deserialization
/// (the HTTP transport builds the object from path segment + body).
pub fn parse_request_value(value: Value) -> Result<PendingCommandRequest, ProtocolError> {
    if !value.is_object() {
        return Err(ProtocolError::NotAnObject);
    }

    let command = value
        .get("command")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingCommand)?
        .to_string();

    if !is_known(&command) {
        return Err(ProtocolError::InvalidCommand(command));
    }

    serde_json::from_value(value).map_err(|source| ProtocolError::BadPayload { command, source })
}

/// Parse a raw request body (the socket transport's single read).
pub fn parse_request(raw: &str) -> Result<PendingCommandRequest, ProtocolError> {
    let value: Value = serde_json::from_str(raw).map_err(ProtocolError::Malformed)?;
    parse_request_value(value)
}
