//! Zero-based text position.

use serde::{Deserialize, Serialize};

/// A zero-based (line, character) position in a document.
///
/// Older primary-editor snapshot writers emit `column` instead of
/// `character`; both are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    #[serde(alias = "column")]
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_line_major() {
        assert!(Position::new(1, 9) < Position::new(2, 0));
        assert!(Position::new(2, 3) < Position::new(2, 4));
        assert!(Position::new(5, 0) > Position::new(2, 3));
    }

    #[test]
    fn test_accepts_column_alias() {
        let p: Position = serde_json::from_str(r#"{"line": 3, "column": 7}"#).unwrap();
        assert_eq!(p, Position::new(3, 7));

        let p: Position = serde_json::from_str(r#"{"line": 3, "character": 7}"#).unwrap();
        assert_eq!(p, Position::new(3, 7));
    }
}
