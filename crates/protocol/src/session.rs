//! Identity of a registered CLI session.

use serde::{Deserialize, Serialize};

/// A remote CLI session as registered in the coordination service.
///
/// Each active session registers itself as one child entry under the fixed
/// root node; `name` is the child-entry identifier and `path` the absolute
/// node path (`root + "/" + name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRef {
    /// Child-entry identifier, unique under the root.
    pub name: String,
    /// Absolute coordination-node path of the session entry.
    pub path: String,
}

impl SessionRef {
    /// Builds the session reference for child `name` under `root`.
    ///
    /// Trailing slashes on `root` are normalized away so the resulting path
    /// never contains a doubled separator.
    pub fn under(root: &str, name: &str) -> Self {
        let path = format!("{}/{}", root.trim_end_matches('/'), name);
        Self {
            name: name.to_string(),
            path,
        }
    }
}

impl std::fmt::Display for SessionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}
