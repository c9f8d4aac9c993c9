//! Capability registries shared with session handlers.
//!
//! Handlers depend only on the [`Capability`] interface, never on concrete
//! plugin types; the registries are built by the host process, frozen behind
//! an `Arc`, and read-only from every handler's perspective.

use std::collections::HashMap;
use std::sync::Arc;

/// A named capability offered to session handlers.
pub trait Capability: Send + Sync {
	/// Stable name used for registry lookup.
	fn name(&self) -> &str;
}

/// Name-keyed collection of capabilities.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
	entries: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `capability` under its own name, returning any displaced entry.
	pub fn register(&mut self, capability: Arc<dyn Capability>) -> Option<Arc<dyn Capability>> {
		self.entries.insert(capability.name().to_string(), capability)
	}

	/// Looks up a capability by name.
	pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
		self.entries.get(name).cloned()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	/// Registered capability names, in no particular order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl FromIterator<Arc<dyn Capability>> for CapabilityRegistry {
	fn from_iter<I: IntoIterator<Item = Arc<dyn Capability>>>(iter: I) -> Self {
		let mut registry = Self::new();
		for capability in iter {
			registry.register(capability);
		}
		registry
	}
}

impl std::fmt::Debug for CapabilityRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CapabilityRegistry")
			.field("names", &self.entries.keys().collect::<Vec<_>>())
			.finish()
	}
}
