//! Shared-secret authentication for the HTTP transport.
//!
//! The socket transport is protected by filesystem permissions; the TCP
//! listener is not, even bound to loopback. At startup the daemon mints a
//! nonce, writes it to `<root>/sidecar-nonce`, and requires it in the
//! `nonce` header of every HTTP request. Local clients read the file;
//! anything else on the loopback interface gets a 401.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context as _, Result};

/// A per-process shared secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce(String);

impl Nonce {
    /// Mint a fresh nonce.
    ///
    /// Not a CSPRNG, but unguessable enough for its job: the hash mixes
    /// the pid, a nanosecond timestamp and a fresh allocation's address,
    /// and the digest never leaves the machine except through the nonce
    /// file.
    pub fn generate() -> Self {
        let pid = std::process::id();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let stack_entropy = Box::new(nanos);
        let address = std::ptr::from_ref(&*stack_entropy) as usize;

        let mut hasher = blake3::Hasher::new();
        hasher.update(&pid.to_le_bytes());
        hasher.update(&nanos.to_le_bytes());
        hasher.update(&address.to_le_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }

    /// Write the nonce where local clients can find it.
    pub fn persist(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.0)
            .with_context(|| format!("failed to write nonce file {}", path.display()))
    }

    /// Does a presented header value match?
    pub fn matches(&self, presented: &str) -> bool {
        self.0 == presented
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
