//! Integration tests for the leadership-gated dispatch loop.
//!
//! All tests run under paused tokio time: a 1s poll interval advances
//! deterministically, so tick boundaries line up with the scripted role and
//! listing changes.

use std::sync::Arc;
use std::time::Duration;

use fleetd::testing::{HandlerScript, MockCoordination, RecordingProtocol, empty_context};
use fleetd::{CoordError, DispatcherConfig, Role, SessionDispatcher, WatchRoleGate};
use tokio::sync::watch;

const ROOT: &str = "/fleet/CLI";
const TICK: Duration = Duration::from_secs(1);

fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

struct Fixture {
	coordination: Arc<MockCoordination>,
	protocol: Arc<RecordingProtocol>,
	role_tx: watch::Sender<Role>,
	dispatcher: SessionDispatcher,
}

fn fixture(script: HandlerScript, initial_role: Role) -> Fixture {
	init_logging();
	let coordination = Arc::new(MockCoordination::new());
	coordination.register(ROOT);
	let protocol = Arc::new(RecordingProtocol::new(script));
	let (role_tx, role_gate) = WatchRoleGate::channel(initial_role);
	let dispatcher = SessionDispatcher::new(
		DispatcherConfig::for_namespace("fleet").with_poll_interval(TICK),
		empty_context(coordination.clone()),
		Arc::new(role_gate),
		protocol.clone(),
	)
	.unwrap();
	Fixture {
		coordination,
		protocol,
		role_tx,
		dispatcher,
	}
}

/// Lets the first (immediate) interval tick run.
async fn first_tick() {
	tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Advances to the next tick boundary.
async fn next_tick() {
	tokio::time::sleep(TICK).await;
}

#[tokio::test(start_paused = true)]
async fn session_is_dispatched_exactly_once() {
	let fx = fixture(HandlerScript::WaitForStop, Role::Leader);
	fx.coordination.add_child(ROOT, "s1");

	let _poller = fx.dispatcher.start_polling();
	first_tick().await;
	assert_eq!(fx.protocol.started(), vec!["s1"]);

	// s1 stays listed for several more ticks; no second handler appears.
	next_tick().await;
	next_tick().await;
	next_tick().await;
	assert_eq!(fx.protocol.started(), vec!["s1"]);
	assert!(fx.coordination.listings() >= 4);
}

#[tokio::test(start_paused = true)]
async fn finished_handler_is_not_redispatched() {
	let fx = fixture(HandlerScript::CompleteImmediately, Role::Leader);
	fx.coordination.add_child(ROOT, "s1");

	let _poller = fx.dispatcher.start_polling();
	first_tick().await;
	next_tick().await;
	next_tick().await;

	// The handler concluded on its own, but the session stays handled.
	assert_eq!(fx.protocol.started(), vec!["s1"]);
}

#[tokio::test(start_paused = true)]
async fn no_dispatch_without_leadership() {
	let fx = fixture(HandlerScript::WaitForStop, Role::Follower);
	fx.coordination.add_child(ROOT, "s1");
	fx.coordination.add_child(ROOT, "s2");

	let _poller = fx.dispatcher.start_polling();
	first_tick().await;
	next_tick().await;
	next_tick().await;

	assert_eq!(fx.protocol.started(), Vec::<String>::new());
	// A non-leader tick skips the listing call entirely.
	assert_eq!(fx.coordination.listings(), 0);
}

#[tokio::test(start_paused = true)]
async fn unknown_role_is_treated_as_non_leader() {
	let fx = fixture(HandlerScript::WaitForStop, Role::Unknown);
	fx.coordination.add_child(ROOT, "s1");

	let _poller = fx.dispatcher.start_polling();
	first_tick().await;
	next_tick().await;

	assert_eq!(fx.protocol.started(), Vec::<String>::new());
	assert_eq!(fx.coordination.listings(), 0);
}

#[tokio::test(start_paused = true)]
async fn demotion_stops_handlers_and_clears_state() {
	let fx = fixture(HandlerScript::WaitForStop, Role::Leader);
	fx.coordination.add_child(ROOT, "s1");
	fx.coordination.add_child(ROOT, "s2");

	let _poller = fx.dispatcher.start_polling();
	first_tick().await;
	assert_eq!(fx.protocol.started(), vec!["s1", "s2"]);

	fx.role_tx.send(Role::Follower).unwrap();
	next_tick().await;

	let mut stopped = fx.protocol.stopped();
	stopped.sort();
	assert_eq!(stopped, vec!["s1", "s2"]);

	// Re-promotion re-lists the root and dispatches the surviving
	// registrations afresh.
	fx.role_tx.send(Role::Leader).unwrap();
	next_tick().await;
	assert_eq!(fx.protocol.started(), vec!["s1", "s2", "s1", "s2"]);
}

#[tokio::test(start_paused = true)]
async fn departed_session_is_not_redispatched_on_return() {
	let fx = fixture(HandlerScript::WaitForStop, Role::Leader);
	fx.coordination.add_child(ROOT, "s1");

	let _poller = fx.dispatcher.start_polling();
	first_tick().await;

	// s1 deregisters and comes back under the same name within the same
	// leadership term; it was already handled once.
	fx.coordination.remove_child(ROOT, "s1");
	next_tick().await;
	fx.coordination.add_child(ROOT, "s1");
	next_tick().await;

	assert_eq!(fx.protocol.started(), vec!["s1"]);
}

#[tokio::test(start_paused = true)]
async fn handler_failure_does_not_stall_dispatch() {
	let fx = fixture(HandlerScript::FailImmediately, Role::Leader);
	fx.coordination.add_child(ROOT, "s1");

	let _poller = fx.dispatcher.start_polling();
	first_tick().await;
	assert_eq!(fx.protocol.started(), vec!["s1"]);

	// s1's handler already failed; the next tick still lists and dispatches.
	fx.coordination.add_child(ROOT, "s2");
	next_tick().await;
	assert_eq!(fx.protocol.started(), vec!["s1", "s2"]);
}

#[tokio::test(start_paused = true)]
async fn listing_failure_skips_the_tick_and_recovers() {
	let fx = fixture(HandlerScript::WaitForStop, Role::Leader);
	fx.coordination.add_child(ROOT, "a");
	fx.coordination.add_child(ROOT, "b");
	fx.coordination.fail_next(CoordError::Unavailable("connection reset".into()));

	let _poller = fx.dispatcher.start_polling();
	first_tick().await;

	// Tick T failed; nothing dispatched yet, loop still alive.
	assert_eq!(fx.protocol.started(), Vec::<String>::new());
	assert_eq!(fx.coordination.listings(), 1);

	next_tick().await;
	assert_eq!(fx.protocol.started(), vec!["a", "b"]);
	assert_eq!(fx.coordination.listings(), 2);
}

#[tokio::test(start_paused = true)]
async fn dispatch_preserves_listing_order() {
	let fx = fixture(HandlerScript::WaitForStop, Role::Leader);
	fx.coordination.add_child(ROOT, "b");
	fx.coordination.add_child(ROOT, "a");

	let _poller = fx.dispatcher.start_polling();
	first_tick().await;

	assert_eq!(fx.protocol.started(), vec!["b", "a"]);
}

/// The three-tick scenario: roles `[Leader, Leader, Follower]`, listings
/// `[{s1}, {s1,s2}, {s1,s2}]`.
#[tokio::test(start_paused = true)]
async fn leader_leader_follower_scenario() {
	let fx = fixture(HandlerScript::WaitForStop, Role::Leader);
	fx.coordination.add_child(ROOT, "s1");

	let _poller = fx.dispatcher.start_polling();

	// Tick 1: leader, {s1} -> spawn s1.
	first_tick().await;
	assert_eq!(fx.protocol.started(), vec!["s1"]);

	// Tick 2: leader, {s1, s2} -> spawn s2 only.
	fx.coordination.add_child(ROOT, "s2");
	next_tick().await;
	assert_eq!(fx.protocol.started(), vec!["s1", "s2"]);

	// Tick 3: follower -> no listing, no spawn, both handlers stopped.
	fx.role_tx.send(Role::Follower).unwrap();
	next_tick().await;
	assert_eq!(fx.protocol.started(), vec!["s1", "s2"]);
	assert_eq!(fx.coordination.listings(), 2);

	let mut stopped = fx.protocol.stopped();
	stopped.sort();
	assert_eq!(stopped, vec!["s1", "s2"]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_polling_and_handlers() {
	let fx = fixture(HandlerScript::WaitForStop, Role::Leader);
	fx.coordination.add_child(ROOT, "s1");

	let poller = fx.dispatcher.start_polling();
	first_tick().await;
	assert_eq!(fx.protocol.started(), vec!["s1"]);

	fx.dispatcher.shutdown();
	poller.await.unwrap();

	assert_eq!(fx.protocol.stopped(), vec!["s1"]);
	let listings = fx.coordination.listings();

	// The loop is gone; further time passing produces no more listings.
	next_tick().await;
	next_tick().await;
	assert_eq!(fx.coordination.listings(), listings);
}

#[tokio::test(start_paused = true)]
async fn unresponsive_handler_does_not_wedge_demotion() {
	init_logging();
	let coordination = Arc::new(MockCoordination::new());
	coordination.register(ROOT);
	coordination.add_child(ROOT, "s1");
	let protocol = Arc::new(RecordingProtocol::new(HandlerScript::IgnoreStop));
	let (role_tx, role_gate) = WatchRoleGate::channel(Role::Leader);
	let dispatcher = SessionDispatcher::new(
		DispatcherConfig::for_namespace("fleet")
			.with_poll_interval(TICK)
			.with_teardown_timeout(Duration::from_millis(200)),
		empty_context(coordination.clone()),
		Arc::new(role_gate),
		protocol.clone(),
	)
	.unwrap();

	let _poller = dispatcher.start_polling();
	first_tick().await;
	assert_eq!(protocol.started(), vec!["s1"]);

	role_tx.send(Role::Follower).unwrap();
	next_tick().await;

	// The handler never acknowledged; teardown aborted it within the bound
	// and the loop keeps polling once re-promoted.
	assert_eq!(protocol.stopped(), Vec::<String>::new());
	role_tx.send(Role::Leader).unwrap();
	next_tick().await;
	assert_eq!(protocol.started(), vec!["s1", "s1"]);
}
