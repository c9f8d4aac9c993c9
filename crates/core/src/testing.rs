//! Testing infrastructure for fleetd.
//!
//! Provides mock collaborators for exercising the dispatcher without a live
//! coordination service:
//! - [`MockCoordination`]: in-memory coordination tree with failure injection
//! - [`RecordingProtocol`]: scripted session protocol that records lifecycle
//!   events per session
//!
//! # Example
//!
//! ```ignore
//! use fleetd::testing::{HandlerScript, MockCoordination, RecordingProtocol, empty_context};
//!
//! #[tokio::test]
//! async fn dispatches_a_session() {
//!     let coordination = Arc::new(MockCoordination::new());
//!     coordination.add_child("/fleet/CLI", "con-1");
//!
//!     let protocol = Arc::new(RecordingProtocol::new(HandlerScript::WaitForStop));
//!     // ... build a SessionDispatcher over empty_context(coordination)
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fleetd_protocol::{CoordError, SessionRef};

use crate::context::SharedContext;
use crate::coord::CoordinationClient;
use crate::error::{DispatchError, Result};
use crate::handler::{SessionProtocol, StopSignal};
use crate::registry::CapabilityRegistry;

/// In-memory coordination tree.
///
/// Children are returned in insertion order, matching the ordered-listing
/// contract of [`CoordinationClient::list_children`]. Queued failures are
/// consumed one per listing call before any data is served.
#[derive(Debug, Default)]
pub struct MockCoordination {
	state: Mutex<MockCoordinationState>,
}

#[derive(Debug, Default)]
struct MockCoordinationState {
	nodes: HashMap<String, Vec<String>>,
	failures: VecDeque<CoordError>,
	listings: u64,
}

impl MockCoordination {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `path` as an existing node with no children.
	pub fn register(&self, path: &str) {
		self.state.lock().unwrap().nodes.entry(path.to_string()).or_default();
	}

	/// Adds child `name` under `path`, registering `path` if needed.
	/// Duplicate names are ignored; insertion order is preserved.
	pub fn add_child(&self, path: &str, name: &str) {
		let mut state = self.state.lock().unwrap();
		let children = state.nodes.entry(path.to_string()).or_default();
		if !children.iter().any(|existing| existing == name) {
			children.push(name.to_string());
		}
	}

	/// Removes child `name` from `path`, if present.
	pub fn remove_child(&self, path: &str, name: &str) {
		let mut state = self.state.lock().unwrap();
		if let Some(children) = state.nodes.get_mut(path) {
			children.retain(|existing| existing != name);
		}
	}

	/// Queues `error` to be returned by the next listing call.
	pub fn fail_next(&self, error: CoordError) {
		self.state.lock().unwrap().failures.push_back(error);
	}

	/// Number of listing calls observed so far.
	pub fn listings(&self) -> u64 {
		self.state.lock().unwrap().listings
	}
}

#[async_trait]
impl CoordinationClient for MockCoordination {
	async fn list_children(&self, path: &str) -> std::result::Result<Vec<String>, CoordError> {
		let mut state = self.state.lock().unwrap();
		state.listings += 1;
		if let Some(error) = state.failures.pop_front() {
			return Err(error);
		}
		state.nodes.get(path).cloned().ok_or_else(|| CoordError::NotFound(path.to_string()))
	}
}

/// What a [`RecordingProtocol`] handler does after recording its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerScript {
	/// Run until the stop signal fires, then record the stop and return.
	WaitForStop,
	/// Never observe the stop signal; park forever.
	IgnoreStop,
	/// Return an error immediately.
	FailImmediately,
	/// Return success immediately.
	CompleteImmediately,
}

/// Session protocol double that records lifecycle events per session.
#[derive(Debug)]
pub struct RecordingProtocol {
	script: HandlerScript,
	started: Mutex<Vec<String>>,
	stopped: Mutex<Vec<String>>,
}

impl RecordingProtocol {
	pub fn new(script: HandlerScript) -> Self {
		Self {
			script,
			started: Mutex::new(Vec::new()),
			stopped: Mutex::new(Vec::new()),
		}
	}

	/// Session names whose handlers started, in spawn order.
	pub fn started(&self) -> Vec<String> {
		self.started.lock().unwrap().clone()
	}

	/// Session names whose handlers observed a stop, in acknowledgement
	/// order.
	pub fn stopped(&self) -> Vec<String> {
		self.stopped.lock().unwrap().clone()
	}
}

#[async_trait]
impl SessionProtocol for RecordingProtocol {
	async fn run(&self, _context: SharedContext, session: SessionRef, mut stop: StopSignal) -> Result<()> {
		self.started.lock().unwrap().push(session.name.clone());
		match self.script {
			HandlerScript::WaitForStop => {
				stop.stopped().await;
				self.stopped.lock().unwrap().push(session.name);
				Ok(())
			}
			HandlerScript::IgnoreStop => {
				std::future::pending::<()>().await;
				Ok(())
			}
			HandlerScript::FailImmediately => {
				Err(DispatchError::Handler(format!("scripted failure for {}", session.name)))
			}
			HandlerScript::CompleteImmediately => Ok(()),
		}
	}
}

/// Builds a [`SharedContext`] over `coordination` with empty registries.
pub fn empty_context(coordination: Arc<dyn CoordinationClient>) -> SharedContext {
	SharedContext::new(
		coordination,
		Arc::new(CapabilityRegistry::new()),
		Arc::new(CapabilityRegistry::new()),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn listings_preserve_insertion_order() {
		let coordination = MockCoordination::new();
		coordination.add_child("/fleet/CLI", "b");
		coordination.add_child("/fleet/CLI", "a");
		coordination.add_child("/fleet/CLI", "b");

		let children = coordination.list_children("/fleet/CLI").await.unwrap();
		assert_eq!(children, vec!["b", "a"]);
	}

	#[tokio::test]
	async fn unregistered_path_reports_not_found() {
		let coordination = MockCoordination::new();
		let err = coordination.list_children("/fleet/CLI").await.unwrap_err();
		assert_eq!(err, CoordError::NotFound("/fleet/CLI".into()));
	}

	#[tokio::test]
	async fn queued_failures_are_consumed_in_order() {
		let coordination = MockCoordination::new();
		coordination.register("/fleet/CLI");
		coordination.fail_next(CoordError::Unavailable("connection reset".into()));
		coordination.fail_next(CoordError::Timeout { ms: 100 });

		assert!(matches!(
			coordination.list_children("/fleet/CLI").await,
			Err(CoordError::Unavailable(_))
		));
		assert!(matches!(
			coordination.list_children("/fleet/CLI").await,
			Err(CoordError::Timeout { ms: 100 })
		));
		assert!(coordination.list_children("/fleet/CLI").await.is_ok());
		assert_eq!(coordination.listings(), 3);
	}
}
