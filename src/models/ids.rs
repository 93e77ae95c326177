//! Store-assigned record identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

record_id!(WorkspaceId, "ws");
record_id!(PaneId, "pane");
record_id!(
    /// One tab inside a pane.
    PaneItemId,
    "item"
);
record_id!(FileId, "file");
record_id!(
    /// A cached editing session for one file in one pane.
    EditorId,
    "editor"
);
