//! Command handlers.
//!
//! `handle_raw` / `handle_value` are the single entry point both
//! transports share: parse, dispatch, and fold every failure mode into a
//! structured JSON reply. Only the `cursorless` handler has its own
//! wrapping (domain-command failures become `commandException` so one
//! failing domain command never looks like a transport problem).

use anyhow::{Context as _, Result, bail};
use serde_json::{Value, json};

use super::context::Context;
use super::request::{PendingCommandRequest, parse_request, parse_request_value};
use crate::state::{DecorationToken, EditorReply, HostSnapshot, Snapshot};
use crate::store::SnapshotStore;
use crate::sync::ReconcileOutcome;
use crate::sync::decorations::{await_change, token_for};
use crate::{debug, log};

/// Handle one raw request body (socket transport).
pub async fn handle_raw(raw: &str, ctx: &Context) -> Value {
    match parse_request(raw) {
        Ok(request) => dispatch(request, ctx).await,
        Err(e) => json!({"error": e.to_string()}),
    }
}

/// Handle one request already in JSON form (HTTP transport).
pub async fn handle_value(value: Value, ctx: &Context) -> Value {
    match parse_request_value(value) {
        Ok(request) => dispatch(request, ctx).await,
        Err(e) => json!({"error": e.to_string()}),
    }
}

/// Dispatch a parsed request, folding handler failures into the
/// structured error reply.
pub async fn dispatch(request: PendingCommandRequest, ctx: &Context) -> Value {
    let name = request.name();
    match run(request, ctx).await {
        Ok(value) => value,
        Err(e) => {
            log!("error"; "command `{}` failed: {:#}", name, e);
            json!({"error": format!("exception during execution: {e:#}")})
        }
    }
}

async fn run(request: PendingCommandRequest, ctx: &Context) -> Result<Value> {
    match request {
        PendingCommandRequest::Ping => Ok(json!({"response": "pong"})),

        PendingCommandRequest::State => {
            let snapshot = host_snapshot(ctx, false).await?;
            Ok(serde_json::to_value(snapshot)?)
        }

        PendingCommandRequest::StateWithContents => {
            let snapshot = host_snapshot(ctx, true).await?;
            Ok(serde_json::to_value(snapshot)?)
        }

        PendingCommandRequest::ApplyPrimaryEditorState => {
            // Fire-and-forget: the reply does not wait for convergence.
            let ctx = ctx.clone();
            tokio::spawn(async move {
                match ctx.reconcile_from(ctx.disk.as_ref()).await {
                    Ok(outcome) => debug!("sync"; "apply requested: {:?}", outcome),
                    Err(e) => log!("sync"; "reconcile failed: {:#}", anyhow::Error::from(e)),
                }
            });
            Ok(json!({"response": "OK"}))
        }

        PendingCommandRequest::UpdateEditorState {
            state,
            file,
            content,
        } => update_editor_state(ctx, state, file.zip(content)).await,

        PendingCommandRequest::Command {
            command_id,
            command_args,
        } => {
            let mut mirror = ctx.mirror.lock().await;
            let result = mirror.host.execute_command(&command_id, &command_args)?;
            Ok(json!({"result": result}))
        }

        PendingCommandRequest::Hats => {
            let hats = ctx.decorations.current()?;
            let cursors = {
                let mirror = ctx.mirror.lock().await;
                mirror
                    .host
                    .active_path()
                    .map(|p| mirror.host.selections(&p))
                    .unwrap_or_default()
            };
            Ok(json!({"hats": hats, "cursors": cursors}))
        }

        PendingCommandRequest::Cursorless { cursorless_args } => {
            Ok(cursorless(ctx, &cursorless_args).await)
        }

        PendingCommandRequest::Pid => Ok(Value::String(std::process::id().to_string())),
    }
}

// =============================================================================
// updateEditorState
// =============================================================================

async fn update_editor_state(
    ctx: &Context,
    state: String,
    document: Option<(String, String)>,
) -> Result<Value> {
    ctx.memory
        .replace(state.clone(), document)
        .context("failed to replace in-memory editor state")?;

    let outcome = ctx.reconcile_from(ctx.memory.as_ref()).await?;

    let token = match outcome {
        ReconcileOutcome::Applied {
            target: Some(target),
            previous_version,
        } => {
            await_change(
                ctx.decorations.as_ref(),
                previous_version.as_deref(),
                &target,
                ctx.config.sync.max_poll_iterations,
                ctx.config.poll_interval(),
            )
            .await
        }

        // Nothing was applied (empty snapshot, disabled, or identical
        // payload): report the current token without waiting.
        _ => {
            let target = Snapshot::parse(&state)
                .ok()
                .and_then(|s| s.active_or_first().map(|e| e.destination_path().to_string()));
            match target {
                Some(target) => ctx
                    .decorations
                    .current()
                    .ok()
                    .and_then(|tokens| token_for(&tokens, &target))
                    .unwrap_or_else(|| DecorationToken::sentinel(target)),
                None => DecorationToken::sentinel(""),
            }
        }
    };

    Ok(serde_json::to_value(token)?)
}

// =============================================================================
// cursorless
// =============================================================================

/// The hosted-editor command id domain commands are proxied through.
const DOMAIN_COMMAND: &str = "cursorless.command";

/// Run one domain command, capturing before/after state. Failures are
/// reported as `commandException` rather than propagated: the remote
/// caller needs to distinguish "your command failed" from "the control
/// plane failed".
async fn cursorless(ctx: &Context, args_json: &str) -> Value {
    let old_state = match host_snapshot(ctx, false).await {
        Ok(s) => s,
        Err(e) => return json!({"commandException": format!("{e:#}")}),
    };

    match run_domain_command(ctx, args_json).await {
        Ok((command_result, token, new_state)) => json!({
            "oldState": old_state,
            "commandResult": command_result,
            "hats": token.hats,
            "newState": new_state,
        }),
        Err(e) => json!({"commandException": format!("{e:#}")}),
    }
}

async fn run_domain_command(
    ctx: &Context,
    args_json: &str,
) -> Result<(String, DecorationToken, HostSnapshot)> {
    if !ctx.flags.sync_enabled() {
        bail!("sidecar is disabled ({}); not running commands", crate::flags::ENABLED_FLAG);
    }

    let args: Vec<Value> =
        serde_json::from_str(args_json).context("domain command arguments are not valid JSON")?;

    let (result, target, previous) = {
        let mut mirror = ctx.mirror.lock().await;
        let target = mirror.host.active_path();
        let previous = match (&target, ctx.decorations.current()) {
            (Some(target), Ok(tokens)) => token_for(&tokens, target).map(|t| t.version_identifier),
            _ => None,
        };
        let result = mirror.host.execute_command(DOMAIN_COMMAND, &args)?;
        (result, target, previous)
    };

    // Decorations are recomputed asynchronously after the command; wait
    // (bounded) so the caller sees the post-command hats.
    let token = match &target {
        Some(target) => {
            await_change(
                ctx.decorations.as_ref(),
                previous.as_deref(),
                target,
                ctx.config.sync.max_poll_iterations,
                ctx.config.poll_interval(),
            )
            .await
        }
        None => DecorationToken::sentinel(""),
    };

    let new_state = host_snapshot(ctx, true).await?;
    let command_result = serde_json::to_string(&result)?;

    Ok((command_result, token, new_state))
}

// =============================================================================
// Hosted-editor snapshots
// =============================================================================

async fn host_snapshot(ctx: &Context, include_contents: bool) -> Result<HostSnapshot> {
    let mirror = ctx.mirror.lock().await;
    let host = mirror.host.as_ref();
    let active = host.active_path();

    let editors: Vec<EditorReply> = host
        .open_paths()
        .into_iter()
        .map(|path| {
            let (first_visible_line, last_visible_line) = host.visible_range(&path);
            EditorReply {
                selections: host.selections(&path),
                first_visible_line,
                last_visible_line,
                active: active.as_deref() == Some(path.as_str()),
                path,
            }
        })
        .collect();

    let mut contents_path = None;
    if include_contents
        && let Some(active) = &active
        && let Some(text) = host.document_text(active)
        && !text.is_empty()
    {
        // The active path is assumed to be a scratch file; its text goes
        // right next to it.
        let out = format!("{active}.out");
        std::fs::write(&out, text).with_context(|| format!("failed to write {out}"))?;
        contents_path = Some(out);
    }

    Ok(HostSnapshot::new(editors, contents_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Mutex;

    use crate::config::test_config;
    use crate::flags::{ENABLED_FLAG, Flags};
    use crate::host::HeadlessHost;
    use crate::server::context::Mirror;
    use crate::state::{Position, Selection};
    use crate::store::{DiskStore, DocumentSource, MemoryStore, SnapshotStore};
    use crate::sync::{MemoryDecorations, SyncEngine};

    struct TestBed {
        ctx: Context,
        decorations: Arc<MemoryDecorations>,
        root: tempfile::TempDir,
    }

    fn testbed_with(build_host: impl FnOnce(&mut HeadlessHost)) -> TestBed {
        let root = tempfile::tempdir().unwrap();
        let config = Arc::new(test_config(root.path()));
        let disk = Arc::new(DiskStore::new(root.path()));
        let memory = Arc::new(MemoryStore::new());
        let decorations = Arc::new(MemoryDecorations::new());

        let sources: Vec<Arc<dyn DocumentSource>> = vec![memory.clone(), disk.clone()];
        let mut host = HeadlessHost::new(sources);
        build_host(&mut host);

        let ctx = Context {
            mirror: Arc::new(Mutex::new(Mirror {
                host: Box::new(host),
                engine: SyncEngine::new(),
            })),
            disk,
            memory,
            decorations: decorations.clone(),
            flags: Flags::new(root.path()),
            config,
        };

        TestBed {
            ctx,
            decorations,
            root,
        }
    }

    fn testbed() -> TestBed {
        testbed_with(|_| {})
    }

    fn token(doc: &str, version: &str) -> crate::state::DecorationToken {
        crate::state::DecorationToken {
            document_id: doc.to_string(),
            version_identifier: version.to_string(),
            hats: serde_json::json!({"default": [[doc, 0, 0]]}),
        }
    }

    #[tokio::test]
    async fn test_ping() {
        let bed = testbed();
        let reply = handle_raw(r#"{"command": "ping"}"#, &bed.ctx).await;
        assert_eq!(reply, json!({"response": "pong"}));
    }

    #[tokio::test]
    async fn test_unknown_command_is_structured_error() {
        let bed = testbed();
        let reply = handle_raw(r#"{"command": "bogus"}"#, &bed.ctx).await;
        assert_eq!(reply, json!({"error": "invalid command: bogus"}));
    }

    #[tokio::test]
    async fn test_malformed_body_is_structured_error() {
        let bed = testbed();
        let reply = handle_raw("{{{{", &bed.ctx).await;
        assert!(reply.get("error").is_some());
    }

    #[tokio::test]
    async fn test_pid() {
        let bed = testbed();
        let reply = handle_raw(r#"{"command": "pid"}"#, &bed.ctx).await;
        assert_eq!(reply, Value::String(std::process::id().to_string()));
    }

    #[tokio::test]
    async fn test_state_reports_open_documents() {
        let bed = testbed();
        {
            let mut mirror = bed.ctx.mirror.lock().await;
            mirror.host.open("/a.txt").unwrap();
            mirror
                .host
                .set_selections(
                    "/a.txt",
                    vec![Selection::new(Position::new(2, 3), Position::new(5, 0))],
                )
                .unwrap();
        }

        let reply = handle_raw(r#"{"command": "state"}"#, &bed.ctx).await;
        assert_eq!(reply["path"], "/a.txt");
        assert_eq!(reply["editors"][0]["active"], Value::Bool(true));
        assert_eq!(reply["editors"][0]["selections"][0]["start"]["line"], 2);
        assert!(reply["contentsPath"].is_null());
    }

    #[tokio::test]
    async fn test_state_with_contents_writes_out_file() {
        let bed = testbed();
        let doc = bed.root.path().join("doc.txt");
        bed.ctx
            .memory
            .replace(
                "{}".to_string(),
                Some((doc.to_string_lossy().into_owned(), "document body".to_string())),
            )
            .unwrap();
        {
            let mut mirror = bed.ctx.mirror.lock().await;
            mirror.host.open(&doc.to_string_lossy()).unwrap();
        }

        let reply = handle_raw(r#"{"command": "stateWithContents"}"#, &bed.ctx).await;
        let contents_path = reply["contentsPath"].as_str().expect("contentsPath set");
        assert!(contents_path.ends_with(".out"));
        assert_eq!(
            std::fs::read_to_string(contents_path).unwrap(),
            "document body"
        );
    }

    #[tokio::test]
    async fn test_command_invokes_host() {
        let bed = testbed_with(|host| {
            host.register_command(
                "demo.echo",
                Box::new(|args| Ok(Value::Array(args.to_vec()))),
            );
        });

        let reply = handle_raw(
            r#"{"command": "command", "commandId": "demo.echo", "commandArgs": [1, 2]}"#,
            &bed.ctx,
        )
        .await;
        assert_eq!(reply, json!({"result": [1, 2]}));
    }

    #[tokio::test]
    async fn test_command_failure_is_execution_error() {
        let bed = testbed();
        let reply = handle_raw(
            r#"{"command": "command", "commandId": "no.such.command"}"#,
            &bed.ctx,
        )
        .await;
        let message = reply["error"].as_str().unwrap();
        assert!(message.starts_with("exception during execution:"), "{message}");
    }

    #[tokio::test]
    async fn test_apply_primary_editor_state_is_fire_and_forget() {
        let bed = testbed();
        std::fs::write(
            bed.root.path().join("editor-state.json"),
            r#"{"activeEditor": {"path": "/watched.txt"}}"#,
        )
        .unwrap();

        let reply = handle_raw(r#"{"command": "applyPrimaryEditorState"}"#, &bed.ctx).await;
        assert_eq!(reply, json!({"response": "OK"}));

        // The reconcile runs in the background; give it a moment.
        for _ in 0..100 {
            if bed.ctx.mirror.lock().await.host.open_paths() == vec!["/watched.txt"] {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("background reconcile never applied the snapshot");
    }

    #[tokio::test]
    async fn test_update_editor_state_reconciles_and_returns_token() {
        let bed = testbed();
        bed.decorations.set(vec![token("/mem.txt", "v1")]);

        let request = json!({
            "command": "updateEditorState",
            "state": r#"{"activeEditor": {"path": "/mem.txt", "cursors": [{"line": 0, "column": 0}]}}"#,
            "file": "/mem.txt",
            "content": "in-memory body",
        });

        // Decorations change shortly after the apply.
        let decorations = bed.decorations.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            decorations.set(vec![token("/mem.txt", "v2")]);
        });

        let reply = handle_value(request, &bed.ctx).await;
        assert_eq!(reply["documentId"], "/mem.txt");
        assert_eq!(reply["versionIdentifier"], "v2");

        let mirror = bed.ctx.mirror.lock().await;
        assert_eq!(mirror.host.open_paths(), vec!["/mem.txt"]);
        assert_eq!(
            mirror.host.document_text("/mem.txt").as_deref(),
            Some("in-memory body")
        );
    }

    #[tokio::test]
    async fn test_hats_returns_decorations_and_cursors() {
        let bed = testbed();
        bed.decorations.set(vec![token("/a.txt", "v1")]);
        {
            let mut mirror = bed.ctx.mirror.lock().await;
            mirror.host.open("/a.txt").unwrap();
            mirror
                .host
                .set_selections("/a.txt", vec![Selection::caret(Position::new(1, 1))])
                .unwrap();
        }

        let reply = handle_raw(r#"{"command": "hats"}"#, &bed.ctx).await;
        assert_eq!(reply["hats"][0]["versionIdentifier"], "v1");
        assert_eq!(reply["cursors"][0]["active"]["line"], 1);
    }

    #[tokio::test]
    async fn test_cursorless_disabled_flag_reports_command_exception() {
        let bed = testbed();
        std::fs::write(bed.root.path().join(ENABLED_FLAG), "false").unwrap();

        let reply = handle_raw(
            r#"{"command": "cursorless", "cursorlessArgs": "[]"}"#,
            &bed.ctx,
        )
        .await;
        let message = reply["commandException"].as_str().unwrap();
        assert!(message.contains("disabled"), "{message}");
    }

    #[tokio::test]
    async fn test_cursorless_captures_before_and_after() {
        let bed = testbed_with(|host| {
            host.register_command(
                "cursorless.command",
                Box::new(|_args| Ok(json!({"took": "action"}))),
            );
        });
        bed.decorations.set(vec![token("/a.txt", "v1")]);
        {
            let mut mirror = bed.ctx.mirror.lock().await;
            mirror.host.open("/a.txt").unwrap();
        }

        let decorations = bed.decorations.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            decorations.set(vec![token("/a.txt", "v2")]);
        });

        let reply = handle_raw(
            r#"{"command": "cursorless", "cursorlessArgs": "[{\"action\": \"take\"}]"}"#,
            &bed.ctx,
        )
        .await;

        assert!(reply["oldState"].is_object());
        assert!(reply["newState"].is_object());
        assert_eq!(
            reply["commandResult"],
            Value::String(r#"{"took":"action"}"#.to_string())
        );
        assert!(reply["hats"].is_object());
    }

    #[tokio::test]
    async fn test_cursorless_domain_failure_is_command_exception() {
        let bed = testbed();
        {
            let mut mirror = bed.ctx.mirror.lock().await;
            mirror.host.open("/a.txt").unwrap();
        }

        // No cursorless.command registered: the host rejects it.
        let reply = handle_raw(
            r#"{"command": "cursorless", "cursorlessArgs": "[]"}"#,
            &bed.ctx,
        )
        .await;
        assert!(reply["commandException"].as_str().unwrap().contains("unknown command"));
    }
}
