//! Shared context passed to every session handler.

use std::sync::Arc;

use crate::coord::CoordinationClient;
use crate::registry::CapabilityRegistry;

/// Immutable bundle of collaborators shared by the dispatcher and all of its
/// session handlers.
///
/// Cloning is cheap (reference counts only) and every clone observes the same
/// frozen registries; no mutation surface is exposed to handlers.
#[derive(Clone)]
pub struct SharedContext {
	coordination: Arc<dyn CoordinationClient>,
	leader_plugins: Arc<CapabilityRegistry>,
	modules: Arc<CapabilityRegistry>,
}

impl SharedContext {
	pub fn new(
		coordination: Arc<dyn CoordinationClient>,
		leader_plugins: Arc<CapabilityRegistry>,
		modules: Arc<CapabilityRegistry>,
	) -> Self {
		Self {
			coordination,
			leader_plugins,
			modules,
		}
	}

	/// Coordination-store read access.
	pub fn coordination(&self) -> &Arc<dyn CoordinationClient> {
		&self.coordination
	}

	/// Capabilities available only while this node is leader.
	pub fn leader_plugins(&self) -> &CapabilityRegistry {
		&self.leader_plugins
	}

	/// Capability plugins available regardless of role.
	pub fn modules(&self) -> &CapabilityRegistry {
		&self.modules
	}
}

impl std::fmt::Debug for SharedContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SharedContext")
			.field("leader_plugins", &self.leader_plugins)
			.field("modules", &self.modules)
			.finish_non_exhaustive()
	}
}
