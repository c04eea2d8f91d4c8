//! Daemon configuration management for `sidecar.toml`.
//!
//! Everything lives under one root directory (default `~/.sidecar`):
//! the snapshot file, the control socket, the nonce file, the flag files
//! and the optional `sidecar.toml`. The config file is optional; every
//! field has a default and unknown keys only warn.
//!
//! | Section   | Purpose                                          |
//! |-----------|--------------------------------------------------|
//! | `[serve]` | Control-plane transports (interface, port, socket)|
//! | `[sync]`  | Reconciliation tuning (polling, debounce)        |

mod handle;
mod section;

pub use handle::{cfg, init_config};
pub use section::{ServeConfig, SyncConfig};

use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::flags::{ENABLED_FLAG, SCROLLING_FLAG};
use crate::log;

/// Config file name under the root directory.
pub const CONFIG_FILE: &str = "sidecar.toml";

/// Nonce file name under the root directory.
pub const NONCE_FILE: &str = "sidecar-nonce";

/// Root configuration structure representing sidecar.toml
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SidecarConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Root directory for all sidecar files (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Control-plane transport settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Reconciliation settings
    #[serde(default)]
    pub sync: SyncConfig,
}

impl SidecarConfig {
    /// Load configuration: resolve the root directory, parse
    /// `sidecar.toml` when present, then apply CLI overrides.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let root = resolve_root(cli);
        let config_path = root.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            parse_config(&content)?
        } else {
            Self::default()
        };

        config.cli = Some(cli);
        config.root = root;
        config.apply_cli_overrides(cli);
        Ok(config)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let crate::cli::Commands::Serve { port, interface } = &cli.command {
            if let Some(port) = port {
                self.serve.port = *port;
            }
            if let Some(interface) = interface {
                self.serve.interface = *interface;
            }
        }
    }

    // Well-known file locations under the root directory.

    pub fn state_path(&self) -> PathBuf {
        self.root.join(crate::store::EDITOR_STATE_FILE)
    }

    pub fn socket_path(&self) -> PathBuf {
        self.root.join(&self.serve.socket)
    }

    pub fn nonce_path(&self) -> PathBuf {
        self.root.join(NONCE_FILE)
    }

    pub fn decorations_path(&self) -> PathBuf {
        self.root.join(crate::sync::decorations::DECORATIONS_FILE)
    }

    pub fn enabled_flag_path(&self) -> PathBuf {
        self.root.join(ENABLED_FLAG)
    }

    pub fn scrolling_flag_path(&self) -> PathBuf {
        self.root.join(SCROLLING_FLAG)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.sync.poll_interval_ms)
    }

    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.sync.debounce_ms)
    }
}

/// Parse config content, warning about unknown keys instead of failing.
fn parse_config(content: &str) -> Result<SidecarConfig> {
    let de = toml::de::Deserializer::new(content);
    let config = serde_ignored::deserialize(de, |path| {
        log!("config"; "unknown key `{}` in {}", path, CONFIG_FILE);
    })
    .context("failed to parse sidecar.toml")?;
    Ok(config)
}

/// Root directory: `--root` flag, then `SIDECAR_ROOT`, then `~/.sidecar`.
fn resolve_root(cli: &Cli) -> PathBuf {
    if let Some(root) = &cli.root {
        return root.clone();
    }
    if let Ok(root) = std::env::var("SIDECAR_ROOT")
        && !root.is_empty()
    {
        return PathBuf::from(root);
    }
    PathBuf::from(shellexpand::tilde("~/.sidecar").into_owned())
}

/// Parse a config for tests, bypassing CLI and filesystem.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SidecarConfig {
    parse_config(content).expect("test config must parse")
}

/// Build a config rooted at an arbitrary directory (integration tests).
#[cfg(test)]
pub fn test_config(root: &std::path::Path) -> SidecarConfig {
    SidecarConfig {
        root: root.to_path_buf(),
        ..SidecarConfig::default()
    }
}
