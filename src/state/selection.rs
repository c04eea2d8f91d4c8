//! Selections with normalized start/end spans.

use serde::{Deserialize, Serialize};

use super::Position;

/// A selection in a document.
///
/// `anchor`/`active` are the authoritative pair (`active` is the caret).
/// `start`/`end` are the order-independent span derived from them; they
/// are always included on the wire for receiver convenience but are never
/// independently authoritative - deserialization ignores incoming values
/// and recomputes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSelection")]
pub struct Selection {
    pub anchor: Position,
    pub active: Position,
    pub start: Position,
    pub end: Position,
}

/// Wire form: only anchor/active are read.
#[derive(Deserialize)]
struct RawSelection {
    anchor: Position,
    active: Position,
}

impl From<RawSelection> for Selection {
    fn from(raw: RawSelection) -> Self {
        Self::new(raw.anchor, raw.active)
    }
}

impl Selection {
    /// Create a selection, deriving the normalized span.
    pub fn new(anchor: Position, active: Position) -> Self {
        let (start, end) = if anchor <= active {
            (anchor, active)
        } else {
            (active, anchor)
        };
        Self {
            anchor,
            active,
            start,
            end,
        }
    }

    /// A point selection (caret only, `anchor == active`).
    pub fn caret(position: Position) -> Self {
        Self::new(position, position)
    }

    /// True when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }
}
