//! Control-plane server.
//!
//! One command-dispatch core exposed identically over two transports:
//!
//! - a local stream socket (`<root>/sidecar-socket`, one JSON request per
//!   connection)
//! - a loopback HTTP endpoint (`POST /control/{command}`, authenticated
//!   with a startup nonce)
//!
//! Both deserialize incoming bytes into a [`request::PendingCommandRequest`]
//! and delegate to [`dispatch`]; every failure mode yields a structured
//! JSON reply rather than a dropped connection, and the process never
//! terminates because of a single bad request.
//!
//! # Module Structure
//!
//! - `context` - shared state both transports dispatch against
//! - `request` - the tagged request union and its parse boundary
//! - `dispatch` - command handlers
//! - `nonce` - shared-secret generation and validation
//! - `http` - tiny_http transport
//! - `socket` - unix stream-socket transport

pub mod context;
pub mod dispatch;
pub mod http;
pub mod nonce;
pub mod request;
#[cfg(unix)]
pub mod socket;

pub use context::Context;
pub use nonce::Nonce;
