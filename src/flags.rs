//! Feature flags backed by plain-text files.
//!
//! A flag is a local file containing `true` or `false` (case-insensitive,
//! trimmed). A missing file or unparsable contents fall back to the
//! caller-supplied default, so deleting a flag file restores stock
//! behavior.
//!
//! Two flags live under the root directory:
//! - `sidecar-enabled` - master switch; `false` disables reconciliation
//!   and domain-command execution so the hosted editor can be used
//!   normally when needed
//! - `sidecar-scrolling` - `false` disables only the visible-range
//!   scroll side effect (useful when the primary editor forwards visible
//!   ranges directly and scrolling is just debugging aid)

use std::path::{Path, PathBuf};

/// Master switch flag file name.
pub const ENABLED_FLAG: &str = "sidecar-enabled";

/// Scroll side-effect flag file name.
pub const SCROLLING_FLAG: &str = "sidecar-scrolling";

/// Read a boolean flag file, falling back to `default` when the file is
/// missing or does not parse.
pub fn read_flag(path: &Path, default: bool) -> bool {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return default;
    };

    match contents.trim().to_ascii_lowercase().as_str() {
        "true" => true,
        "false" => false,
        _ => default,
    }
}

/// The daemon's flag set, resolved against the root directory.
#[derive(Debug, Clone)]
pub struct Flags {
    enabled: PathBuf,
    scrolling: PathBuf,
}

impl Flags {
    pub fn new(root: &Path) -> Self {
        Self {
            enabled: root.join(ENABLED_FLAG),
            scrolling: root.join(SCROLLING_FLAG),
        }
    }

    /// Is synchronization (and domain-command execution) enabled?
    pub fn sync_enabled(&self) -> bool {
        read_flag(&self.enabled, true)
    }

    /// Is the scroll-reveal side effect enabled?
    pub fn scrolling_enabled(&self) -> bool {
        read_flag(&self.scrolling, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        assert!(read_flag(&path, true));
        assert!(!read_flag(&path, false));
    }

    #[test]
    fn test_parses_true_and_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flag");

        std::fs::write(&path, "true").unwrap();
        assert!(read_flag(&path, false));

        std::fs::write(&path, "false").unwrap();
        assert!(!read_flag(&path, true));
    }

    #[test]
    fn test_trims_and_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flag");

        std::fs::write(&path, "  TRUE\n").unwrap();
        assert!(read_flag(&path, false));

        std::fs::write(&path, "False ").unwrap();
        assert!(!read_flag(&path, true));
    }

    #[test]
    fn test_garbage_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flag");
        std::fs::write(&path, "maybe").unwrap();
        assert!(read_flag(&path, true));
        assert!(!read_flag(&path, false));
    }

    #[test]
    fn test_flag_set_defaults_on() {
        let dir = tempfile::tempdir().unwrap();
        let flags = Flags::new(dir.path());
        assert!(flags.sync_enabled());
        assert!(flags.scrolling_enabled());

        std::fs::write(dir.path().join(ENABLED_FLAG), "false").unwrap();
        assert!(!flags.sync_enabled());
        assert!(flags.scrolling_enabled());
    }
}
