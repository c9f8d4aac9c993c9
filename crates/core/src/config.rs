//! Dispatcher configuration.
//!
//! Bound once at construction; the polling loop never re-reads it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// Namespace used when no explicit root path is configured.
pub const DEFAULT_NAMESPACE: &str = "fleetd";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a [`SessionDispatcher`].
///
/// [`SessionDispatcher`]: crate::dispatcher::SessionDispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
	/// Coordination node under which each active CLI session registers
	/// itself as a child entry.
	pub root_path: String,
	/// Interval between child listings while leader.
	pub poll_interval: Duration,
	/// Bound on how long a handler may take to acknowledge a stop signal
	/// before it is aborted.
	pub teardown_timeout: Duration,
}

impl DispatcherConfig {
	/// Configuration rooted at `/<namespace>/CLI` with default timings.
	pub fn for_namespace(namespace: &str) -> Self {
		Self {
			root_path: format!("/{namespace}/CLI"),
			..Self::default()
		}
	}

	/// Sets the coordination root path.
	pub fn with_root_path(mut self, root_path: impl Into<String>) -> Self {
		self.root_path = root_path.into();
		self
	}

	/// Sets the polling interval.
	pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}

	/// Sets the teardown acknowledgement bound.
	pub fn with_teardown_timeout(mut self, teardown_timeout: Duration) -> Self {
		self.teardown_timeout = teardown_timeout;
		self
	}

	/// Rejects configurations the polling loop could not run with.
	pub fn validate(&self) -> Result<()> {
		if self.root_path.is_empty() {
			return Err(DispatchError::Config("root_path must not be empty".into()));
		}
		if !self.root_path.starts_with('/') {
			return Err(DispatchError::Config(format!(
				"root_path must be absolute, got {:?}",
				self.root_path
			)));
		}
		if self.poll_interval.is_zero() {
			return Err(DispatchError::Config("poll_interval must be positive".into()));
		}
		if self.teardown_timeout.is_zero() {
			return Err(DispatchError::Config("teardown_timeout must be positive".into()));
		}
		Ok(())
	}
}

impl Default for DispatcherConfig {
	fn default() -> Self {
		Self {
			root_path: format!("/{DEFAULT_NAMESPACE}/CLI"),
			poll_interval: DEFAULT_POLL_INTERVAL,
			teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
		}
	}
}
