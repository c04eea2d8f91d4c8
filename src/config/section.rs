//! `[serve]` and `[sync]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"   # HTTP transport is loopback-only by default
//! port = 7459               # HTTP port number
//! socket = "sidecar-socket" # stream-socket file name under the root
//!
//! [sync]
//! poll_interval_ms = 10     # decoration wait loop poll interval
//! max_poll_iterations = 15  # decoration wait loop budget
//! debounce_ms = 100         # snapshot watcher quiet period
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;

/// Control-plane transport settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface for the HTTP transport.
    /// `127.0.0.1` (default) keeps the control plane local-only.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Stream-socket file name under the root directory.
    pub socket: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 7459,
            socket: "sidecar-socket".to_string(),
        }
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Sleep between decoration polls, in milliseconds.
    pub poll_interval_ms: u64,

    /// Decoration wait loop iteration budget.
    pub max_poll_iterations: u32,

    /// Quiet period before a snapshot file change triggers
    /// reconciliation, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            max_poll_iterations: 15,
            debounce_ms: 100,
        }
    }
}
