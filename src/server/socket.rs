//! Local stream-socket transport.
//!
//! One request per connection: the client writes a single JSON object,
//! shuts down its write half, and reads the reply. There is no framing
//! beyond the connection itself, so a request must fit in one buffer; the
//! control-plane payloads are small enough that this has never been a
//! practical limit.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};

use super::context::Context;
use super::dispatch::handle_raw;
use crate::{debug, log};

/// Upper bound on a single request body.
const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Bind the socket, replacing a stale file left by a previous run.
///
/// A previous daemon that died without cleanup leaves the socket file
/// behind; binding would fail with `AddrInUse`. Nothing else is allowed
/// to own this path, so unlinking first is always safe.
pub fn bind(path: &Path) -> Result<UnixListener> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("failed to remove stale socket {}", path.display()))?;
    }

    UnixListener::bind(path).with_context(|| format!("failed to bind socket {}", path.display()))
}

/// Accept loop. Runs until the daemon shuts down; a failed connection is
/// logged and never takes the listener down.
pub async fn run(listener: UnixListener, socket_path: PathBuf, ctx: Context) {
    log!("socket"; "listening on {}", socket_path.display());

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(stream, &ctx).await {
                        log!("socket"; "connection failed: {:#}", e);
                    }
                });
            }
            Err(e) => {
                log!("socket"; "accept failed: {}", e);
            }
        }
    }
}

async fn serve_connection(mut stream: UnixStream, ctx: &Context) -> Result<()> {
    let mut buffer = vec![0u8; MAX_REQUEST_BYTES];
    let mut filled = 0;

    // Read until EOF (client shutdown) or the buffer is full.
    loop {
        let n = stream
            .read(&mut buffer[filled..])
            .await
            .context("failed to read request")?;
        if n == 0 {
            break;
        }
        filled += n;
        if filled == buffer.len() {
            break;
        }
    }

    let raw = String::from_utf8_lossy(&buffer[..filled]);
    debug!("socket"; "request: {}", raw.trim());

    let reply = handle_raw(&raw, ctx).await;
    let body = serde_json::to_string(&reply).context("failed to serialize reply")?;

    stream
        .write_all(body.as_bytes())
        .await
        .context("failed to write reply")?;
    stream.shutdown().await.ok();
    Ok(())
}
