//! Loopback HTTP transport.
//!
//! `POST /control/{command}` with the request payload as the JSON body;
//! the command name comes from the path and is merged into the payload
//! before dispatch. Every request must carry the startup nonce in the
//! `nonce` header; a missing or wrong nonce is rejected before the body
//! is even parsed.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{Map, Value, json};
use tiny_http::{Header, Method, Request, Response, Server};

use super::context::Context;
use super::dispatch::handle_value;
use super::nonce::Nonce;
use crate::{debug, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(
    interface: std::net::IpAddr,
    base_port: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

/// Request loop (blocking). Runs until the server is unblocked by the
/// shutdown handler.
pub fn run_request_loop(
    server: &Server,
    ctx: Context,
    nonce: Arc<Nonce>,
    handle: tokio::runtime::Handle,
) {
    // Handlers can block on the decoration wait loop; a small pool keeps
    // one slow command from starving the others.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create thread pool");

    for request in server.incoming_requests() {
        let ctx = ctx.clone();
        let nonce = Arc::clone(&nonce);
        let handle = handle.clone();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &ctx, &nonce, &handle) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request.
fn handle_request(
    mut request: Request,
    ctx: &Context,
    nonce: &Nonce,
    handle: &tokio::runtime::Handle,
) -> Result<()> {
    if crate::core::is_shutdown() {
        return respond_status(request, 503);
    }

    let Some(command) = control_command(&request) else {
        return respond_status(request, 404);
    };

    // Authenticate before touching the body.
    let presented = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("nonce"))
        .map(|h| h.value.as_str().to_string());
    if !presented.is_some_and(|p| nonce.matches(&p)) {
        log!("serve"; "rejected request without valid nonce");
        return respond_status(request, 401);
    }

    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        log!("serve"; "failed to read request body: {}", e);
        return respond_status(request, 501);
    }
    debug!("serve"; "{} {}", command, body.trim());

    let mut payload: Map<String, Value> = if body.trim().is_empty() {
        Map::new()
    } else {
        match serde_json::from_str(&body) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                return respond_json(request, 400, &json!({"error": "request is not a JSON object"}));
            }
        }
    };

    // The path segment wins over any `command` field in the body.
    payload.insert("command".to_string(), Value::String(command));

    let reply = handle.block_on(handle_value(Value::Object(payload), ctx));
    respond_json(request, 200, &reply)
}

/// Extract the command segment from `POST /control/{command}`.
fn control_command(request: &Request) -> Option<String> {
    if *request.method() != Method::Post {
        return None;
    }
    let command = request.url().strip_prefix("/control/")?;
    if command.is_empty() || command.contains('/') {
        return None;
    }
    Some(command.to_string())
}

fn respond_json(request: Request, status: u16, body: &Value) -> Result<()> {
    let response = Response::from_string(serde_json::to_string(body)?)
        .with_status_code(status)
        .with_header(Header::from_bytes("Content-Type", "text/json").unwrap());
    request.respond(response)?;
    Ok(())
}

fn respond_status(request: Request, status: u16) -> Result<()> {
    request.respond(Response::empty(status))?;
    Ok(())
}
