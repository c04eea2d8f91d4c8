//! Bounded polling of the decoration side-channel.
//!
//! Decorations ("hats") are computed asynchronously by a separate
//! subsystem after editor state changes; there is no push notification.
//! The wait loop polls the provider until the target document's version
//! identifier changes or the iteration budget runs out. Budget exhaustion
//! is a soft timeout: callers prefer a stale-but-present answer over an
//! indefinite hang.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;

use crate::debug;
use crate::state::DecorationToken;
use crate::utils::normalize_path_str;

/// File name of the decoration dump under the root directory.
pub const DECORATIONS_FILE: &str = "decorations.json";

/// Source of the current decoration token set.
pub trait DecorationProvider: Send + Sync {
    fn current(&self) -> io::Result<Vec<DecorationToken>>;
}

// =============================================================================
// Providers
// =============================================================================

/// Decorations read from `decorations.json` under the root directory.
///
/// The file is written by the external decoration subsystem; a missing
/// file means nothing has been computed yet.
pub struct DiskDecorations {
    path: PathBuf,
}

impl DiskDecorations {
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(DECORATIONS_FILE),
        }
    }
}

impl DecorationProvider for DiskDecorations {
    fn current(&self) -> io::Result<Vec<DecorationToken>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&raw).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// In-memory decorations for headless sessions and tests.
#[derive(Default)]
pub struct MemoryDecorations {
    tokens: Mutex<Vec<DecorationToken>>,
}

impl MemoryDecorations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the token set.
    pub fn set(&self, tokens: Vec<DecorationToken>) {
        *self.tokens.lock() = tokens;
    }
}

impl DecorationProvider for MemoryDecorations {
    fn current(&self) -> io::Result<Vec<DecorationToken>> {
        Ok(self.tokens.lock().clone())
    }
}

// =============================================================================
// Wait loop
// =============================================================================

/// Select the token for a document, comparing normalized paths.
pub fn token_for(tokens: &[DecorationToken], document: &str) -> Option<DecorationToken> {
    let target = normalize_path_str(document);
    tokens
        .iter()
        .find(|t| normalize_path_str(&t.document_id) == target)
        .cloned()
}

/// Poll the provider until the target document's version identifier
/// differs from both `previous` and the "nothing computed yet" sentinel,
/// or the iteration budget is exhausted.
///
/// Returns the last-seen token (possibly still the sentinel) on budget
/// exhaustion - a soft timeout, never an error.
pub async fn await_change(
    provider: &dyn DecorationProvider,
    previous: Option<&str>,
    document: &str,
    max_iterations: u32,
    poll_interval: Duration,
) -> DecorationToken {
    let mut last: Option<DecorationToken> = None;

    for iteration in 0..max_iterations {
        match provider.current() {
            Ok(tokens) => {
                if let Some(token) = token_for(&tokens, document) {
                    let changed =
                        !token.is_sentinel() && previous != Some(token.version_identifier.as_str());
                    if changed {
                        return token;
                    }
                    last = Some(token);
                }
            }
            Err(e) => {
                debug!("sync"; "decoration provider error (poll {}): {}", iteration, e);
            }
        }

        tokio::time::sleep(poll_interval).await;
    }

    debug!(
        "sync";
        "no decoration change for {} after {} polls, returning last seen",
        document, max_iterations
    );
    last.unwrap_or_else(|| DecorationToken::sentinel(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn token(doc: &str, version: &str) -> DecorationToken {
        DecorationToken {
            document_id: doc.to_string(),
            version_identifier: version.to_string(),
            hats: serde_json::json!({"default": []}),
        }
    }

    #[tokio::test]
    async fn test_returns_changed_token_immediately() {
        let provider = MemoryDecorations::new();
        provider.set(vec![token("/a.txt", "v2"), token("/b.txt", "v9")]);

        let got = await_change(
            &provider,
            Some("v1"),
            "/a.txt",
            15,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(got.version_identifier, "v2");
        assert_eq!(got.document_id, "/a.txt");
    }

    #[tokio::test]
    async fn test_bounded_termination_when_nothing_changes() {
        let provider = MemoryDecorations::new();
        provider.set(vec![token("/a.txt", "v1")]);

        let start = Instant::now();
        let got = await_change(
            &provider,
            Some("v1"),
            "/a.txt",
            5,
            Duration::from_millis(2),
        )
        .await;

        // Soft timeout: the stale token comes back, within the budget.
        assert_eq!(got.version_identifier, "v1");
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_sentinel_never_counts_as_change() {
        let provider = MemoryDecorations::new();
        provider.set(vec![DecorationToken::sentinel("/a.txt")]);

        let got = await_change(&provider, None, "/a.txt", 3, Duration::from_millis(1)).await;
        assert!(got.is_sentinel());
    }

    #[tokio::test]
    async fn test_missing_document_returns_sentinel() {
        let provider = MemoryDecorations::new();
        let got = await_change(&provider, None, "/a.txt", 3, Duration::from_millis(1)).await;
        assert!(got.is_sentinel());
        assert_eq!(got.document_id, "/a.txt");
    }

    #[tokio::test]
    async fn test_picks_up_change_mid_loop() {
        let provider = Arc::new(MemoryDecorations::new());
        provider.set(vec![token("/a.txt", "v1")]);

        let writer = provider.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.set(vec![token("/a.txt", "v2")]);
        });

        let got = await_change(
            provider.as_ref(),
            Some("v1"),
            "/a.txt",
            100,
            Duration::from_millis(5),
        )
        .await;
        assert_eq!(got.version_identifier, "v2");
    }

    #[test]
    fn test_disk_provider_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DiskDecorations::new(dir.path());
        assert!(provider.current().unwrap().is_empty());
    }

    #[test]
    fn test_disk_provider_parses_tokens() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DECORATIONS_FILE),
            r#"[{"documentId": "/a.txt", "versionIdentifier": "v1", "hats": {}}]"#,
        )
        .unwrap();

        let provider = DiskDecorations::new(dir.path());
        let tokens = provider.current().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].version_identifier, "v1");
    }
}
