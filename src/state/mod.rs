//! Snapshot data model.
//!
//! The normalized representation of "what an editor currently looks like",
//! used in three places:
//! - parsing the primary editor's snapshot file (`Snapshot`)
//! - driving the hosted editor during reconciliation
//! - serializing control-plane replies (`HostSnapshot`)
//!
//! # Module Structure
//!
//! - `position` / `selection` - zero-based text coordinates
//! - `snapshot` - the primary editor's snapshot wire format
//! - `reply` - the hosted editor's serialized reply format
//! - `decoration` - versioned per-document annotation tokens

mod decoration;
mod position;
mod reply;
mod selection;
mod snapshot;

pub use decoration::DecorationToken;
pub use position::Position;
pub use reply::{EditorReply, HostSnapshot};
pub use selection::Selection;
pub use snapshot::{EditorState, Snapshot};
