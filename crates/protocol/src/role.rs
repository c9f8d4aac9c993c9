//! Fleet membership roles.
//!
//! The coordination service's election mechanism assigns each node exactly
//! one of these roles at any moment; the value can change asynchronously.

use serde::{Deserialize, Serialize};

/// Fleet-wide role of the local node.
///
/// Only a `Leader` may dispatch session handlers. Anything else - including
/// `Unknown`, reported when the role cannot currently be determined - means
/// "do not act".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Elected leader; sole node allowed to drive CLI sessions.
    Leader,
    /// Healthy non-leader member.
    Follower,
    /// Role not currently determinable (election in progress, connection
    /// loss). Treated exactly like `Follower` by consumers.
    Unknown,
}

impl Role {
    /// Returns `true` only for [`Role::Leader`].
    pub fn is_leader(self) -> bool {
        matches!(self, Role::Leader)
    }
}

impl Default for Role {
    /// Fail safe: a node that has not observed an election result yet must
    /// not act as leader.
    fn default() -> Self {
        Role::Unknown
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Leader => "leader",
            Role::Follower => "follower",
            Role::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
