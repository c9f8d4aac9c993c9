//! Per-session handler tasks.
//!
//! One handler task runs per discovered session, concurrently with its
//! siblings and with the dispatcher's polling loop. The protocol serviced
//! inside a handler is host-provided; this module owns only the lifecycle:
//! spawn, cooperative stop, bounded join.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fleetd_protocol::SessionRef;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::context::SharedContext;
use crate::error::Result;

/// Host-provided protocol logic serviced inside each handler.
///
/// Implementations must observe `stop` and return promptly once it fires;
/// the dispatcher waits a bounded time for that acknowledgement during
/// teardown and aborts the task afterwards.
#[async_trait]
pub trait SessionProtocol: Send + Sync {
	/// Services `session` until its work concludes or `stop` fires.
	async fn run(&self, context: SharedContext, session: SessionRef, stop: StopSignal) -> Result<()>;
}

/// Cooperative stop signal delivered to a running handler.
#[derive(Debug, Clone)]
pub struct StopSignal {
	rx: watch::Receiver<bool>,
}

impl StopSignal {
	pub(crate) fn new(rx: watch::Receiver<bool>) -> Self {
		Self { rx }
	}

	/// Returns `true` once a stop has been requested.
	pub fn is_stopped(&self) -> bool {
		*self.rx.borrow()
	}

	/// Resolves when a stop is requested. A dropped signalling side counts
	/// as a stop request.
	pub async fn stopped(&mut self) {
		let _ = self.rx.wait_for(|stop| *stop).await;
	}
}

/// Handle to a live handler task, owned by the dispatcher's registry.
pub struct HandlerHandle {
	session: SessionRef,
	stop_tx: watch::Sender<bool>,
	task: JoinHandle<()>,
}

impl HandlerHandle {
	/// The session this handler services.
	pub fn session(&self) -> &SessionRef {
		&self.session
	}

	/// Requests a cooperative stop. Returns immediately; the handler
	/// acknowledges by finishing its task.
	pub fn signal_stop(&self) {
		let _ = self.stop_tx.send(true);
	}

	/// Whether the handler task has already finished.
	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}

	/// Waits up to `timeout` for the handler task to finish.
	///
	/// Returns `false` when the handler missed the bound, in which case the
	/// task is aborted. A handler that finished by panicking still counts as
	/// joined; the panic is contained to the task and logged here.
	pub async fn join(mut self, timeout: Duration) -> bool {
		match tokio::time::timeout(timeout, &mut self.task).await {
			Ok(Ok(())) => true,
			Ok(Err(err)) => {
				if err.is_panic() {
					warn!(
						target = "fleetd.session",
						session = %self.session.name,
						"session handler panicked"
					);
				}
				true
			}
			Err(_) => {
				self.task.abort();
				warn!(
					target = "fleetd.session",
					session = %self.session.name,
					timeout_ms = timeout.as_millis() as u64,
					"session handler ignored stop signal; aborted"
				);
				false
			}
		}
	}
}

impl std::fmt::Debug for HandlerHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HandlerHandle")
			.field("session", &self.session.path)
			.field("finished", &self.is_finished())
			.finish()
	}
}

/// Spawns the handler task for `session`.
///
/// A protocol error or panic is contained to the spawned task and surfaced
/// through logging only; neither the dispatcher nor sibling handlers observe
/// it.
pub(crate) fn spawn(
	protocol: Arc<dyn SessionProtocol>,
	context: SharedContext,
	session: SessionRef,
) -> HandlerHandle {
	let (stop_tx, stop_rx) = watch::channel(false);
	let task = tokio::spawn({
		let session = session.clone();
		async move {
			let stop = StopSignal::new(stop_rx);
			if let Err(err) = protocol.run(context, session.clone(), stop).await {
				warn!(
					target = "fleetd.session",
					session = %session.name,
					error = %err,
					"session handler failed"
				);
			}
		}
	});
	HandlerHandle {
		session,
		stop_tx,
		task,
	}
}
