//! The leadership-gated polling loop.
//!
//! While this node is leader the dispatcher lists the coordination root on
//! every tick, spawns exactly one handler per newly observed session, and
//! keeps the handled-set and handler registry consistent under one lock. On
//! demotion it stops every live handler before the next dispatch step can
//! run, so no handler from a stale leadership term survives.

use std::collections::HashSet;
use std::sync::Arc;

use fleetd_protocol::SessionRef;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::DispatcherConfig;
use crate::context::SharedContext;
use crate::coord::RoleGate;
use crate::error::Result;
use crate::handler::{self, HandlerHandle, SessionProtocol};

/// Discovers CLI sessions under the coordination root and dispatches one
/// handler per session, while this node holds leadership.
pub struct SessionDispatcher {
	inner: Arc<Inner>,
	shutdown_tx: watch::Sender<bool>,
}

struct Inner {
	config: DispatcherConfig,
	context: SharedContext,
	roles: Arc<dyn RoleGate>,
	protocol: Arc<dyn SessionProtocol>,
	state: Mutex<DispatchState>,
}

/// Handled names and live handles are guarded together: a name marked
/// handled is observable in the registry before the lock is released, and
/// teardown clears both under one acquisition.
#[derive(Default)]
struct DispatchState {
	handled: HashSet<String>,
	handlers: Vec<HandlerHandle>,
	was_leader: bool,
}

impl SessionDispatcher {
	/// Builds a dispatcher over `context`, gated by `roles`, servicing each
	/// discovered session with `protocol`.
	///
	/// Fails fast on an unusable `config`; nothing is polled until
	/// [`start_polling`](Self::start_polling) is called.
	pub fn new(
		config: DispatcherConfig,
		context: SharedContext,
		roles: Arc<dyn RoleGate>,
		protocol: Arc<dyn SessionProtocol>,
	) -> Result<Self> {
		config.validate()?;
		let (shutdown_tx, _) = watch::channel(false);
		info!(
			target = "fleetd.cli",
			root = %config.root_path,
			interval_ms = config.poll_interval.as_millis() as u64,
			"session dispatcher initialized"
		);
		Ok(Self {
			inner: Arc::new(Inner {
				config,
				context,
				roles,
				protocol,
				state: Mutex::new(DispatchState::default()),
			}),
			shutdown_tx,
		})
	}

	/// Starts the polling loop in its own task and returns immediately.
	///
	/// The loop runs until [`shutdown`](Self::shutdown) is called or the
	/// dispatcher is dropped. Expects a single poller; a second call starts
	/// a competing loop.
	pub fn start_polling(&self) -> JoinHandle<()> {
		let inner = Arc::clone(&self.inner);
		let shutdown_rx = self.shutdown_tx.subscribe();
		let task = tokio::spawn(poll_loop(inner, shutdown_rx));
		info!(target = "fleetd.cli", "session polling started");
		task
	}

	/// Requests a deterministic stop of the polling loop.
	///
	/// The loop tears down live handlers before exiting; await the handle
	/// returned by [`start_polling`](Self::start_polling) to observe
	/// completion.
	pub fn shutdown(&self) {
		let _ = self.shutdown_tx.send(true);
	}

	/// Configuration bound at construction.
	pub fn config(&self) -> &DispatcherConfig {
		&self.inner.config
	}
}

async fn poll_loop(inner: Arc<Inner>, mut shutdown_rx: watch::Receiver<bool>) {
	let mut ticker = time::interval(inner.config.poll_interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		tokio::select! {
			changed = shutdown_rx.changed() => {
				// A dropped sender means the dispatcher itself is gone.
				if changed.is_err() || *shutdown_rx.borrow() {
					inner.teardown("shutdown").await;
					break;
				}
			}
			_ = ticker.tick() => inner.tick().await,
		}
	}

	info!(target = "fleetd.cli", "session polling stopped");
}

impl Inner {
	/// One poll: role check, demotion teardown, listing, dispatch.
	async fn tick(&self) {
		let role = self.roles.role();
		if !role.is_leader() {
			let demoted = {
				let mut state = self.state.lock().await;
				std::mem::replace(&mut state.was_leader, false)
			};
			if demoted {
				warn!(target = "fleetd.cli", %role, "leadership lost; stopping session handlers");
				self.teardown("demotion").await;
			}
			return;
		}

		self.state.lock().await.was_leader = true;

		let children = match self.context.coordination().list_children(&self.config.root_path).await {
			Ok(children) => children,
			Err(err) => {
				warn!(
					target = "fleetd.cli",
					root = %self.config.root_path,
					error = %err,
					"session listing failed; retrying next poll"
				);
				return;
			}
		};

		let mut state = self.state.lock().await;
		state.handlers.retain(|handle| !handle.is_finished());
		for name in children {
			if !state.handled.insert(name.clone()) {
				continue;
			}
			let session = SessionRef::under(&self.config.root_path, &name);
			let handle = handler::spawn(Arc::clone(&self.protocol), self.context.clone(), session);
			info!(target = "fleetd.cli", session = %name, "started session handler");
			state.handlers.push(handle);
		}
	}

	/// Stops every live handler and resets dispatch state.
	///
	/// All handles are stop-signalled first so handlers wind down
	/// concurrently, then each join is awaited up to the configured bound.
	/// The handled-set is cleared with the registry: sessions still
	/// registered when this node regains leadership are dispatched afresh.
	async fn teardown(&self, reason: &str) {
		let handlers = {
			let mut state = self.state.lock().await;
			state.handled.clear();
			std::mem::take(&mut state.handlers)
		};
		if handlers.is_empty() {
			return;
		}

		for handle in &handlers {
			handle.signal_stop();
		}

		let count = handlers.len();
		let mut acked = 0usize;
		for handle in handlers {
			if handle.join(self.config.teardown_timeout).await {
				acked += 1;
			}
		}
		info!(target = "fleetd.cli", count, acked, reason, "session handlers stopped");
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use fleetd_protocol::Role;

	use super::*;
	use crate::coord::WatchRoleGate;
	use crate::testing::{HandlerScript, MockCoordination, RecordingProtocol, empty_context};

	#[tokio::test]
	async fn construction_rejects_bad_config() {
		let (_role_tx, gate) = WatchRoleGate::channel(Role::Leader);
		let result = SessionDispatcher::new(
			DispatcherConfig::default().with_poll_interval(Duration::ZERO),
			empty_context(Arc::new(MockCoordination::new())),
			Arc::new(gate),
			Arc::new(RecordingProtocol::new(HandlerScript::WaitForStop)),
		);
		assert!(result.is_err());
	}

	#[tokio::test]
	async fn config_is_reachable_after_construction() {
		let (_role_tx, gate) = WatchRoleGate::channel(Role::Leader);
		let dispatcher = SessionDispatcher::new(
			DispatcherConfig::for_namespace("fleet"),
			empty_context(Arc::new(MockCoordination::new())),
			Arc::new(gate),
			Arc::new(RecordingProtocol::new(HandlerScript::WaitForStop)),
		)
		.unwrap();
		assert_eq!(dispatcher.config().root_path, "/fleet/CLI");
	}
}
