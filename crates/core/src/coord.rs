//! Coordination-service seams consumed by the dispatcher.
//!
//! The client itself (connection management, re-establishment, watch
//! primitives) lives outside this crate; the dispatcher only needs a child
//! listing and a narrow read of the current fleet role.

use async_trait::async_trait;
use fleetd_protocol::{CoordError, Role};
use tokio::sync::watch;

/// Read access to the coordination store.
#[async_trait]
pub trait CoordinationClient: Send + Sync {
	/// Lists child-entry names under `path`, in the order the store returns
	/// them.
	///
	/// Implementations are expected to bound the call with their own
	/// deadline and surface overruns as [`CoordError::Timeout`].
	async fn list_children(&self, path: &str) -> std::result::Result<Vec<String>, CoordError>;
}

/// Narrow accessor for the current fleet role.
///
/// The value can change asynchronously between reads; callers must re-read
/// it on every tick rather than cache it. Implementations that cannot
/// determine the role report [`Role::Unknown`].
pub trait RoleGate: Send + Sync {
	/// Returns the role as currently observed.
	fn role(&self) -> Role;
}

/// [`RoleGate`] over a [`watch`] channel fed by the coordination client.
///
/// When the publishing side goes away the gate keeps reporting the last
/// published value; publishers that lose their election session are expected
/// to publish [`Role::Unknown`] before dropping the sender.
#[derive(Debug, Clone)]
pub struct WatchRoleGate {
	rx: watch::Receiver<Role>,
}

impl WatchRoleGate {
	/// Wraps an existing role feed.
	pub fn new(rx: watch::Receiver<Role>) -> Self {
		Self { rx }
	}

	/// Creates a fresh feed seeded with `initial`, returning the publishing
	/// half alongside the gate.
	pub fn channel(initial: Role) -> (watch::Sender<Role>, Self) {
		let (tx, rx) = watch::channel(initial);
		(tx, Self { rx })
	}
}

impl RoleGate for WatchRoleGate {
	fn role(&self) -> Role {
		*self.rx.borrow()
	}
}
