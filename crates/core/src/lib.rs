//! fleetd: leadership-gated CLI session dispatch for fleet nodes.
//!
//! Each active remote CLI session registers itself as a child entry under a
//! fixed coordination-service node. While the local process holds the
//! fleet-wide leader role, the [`SessionDispatcher`] polls that node, spawns
//! exactly one isolated handler task per newly observed session, and tears
//! every handler down again on demotion - so no two nodes ever drive the
//! same session concurrently.
//!
//! The coordination client itself is consumed through the
//! [`CoordinationClient`] and [`RoleGate`] seams; what a handler does with a
//! session is host-provided through [`SessionProtocol`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use fleetd::{DispatcherConfig, SessionDispatcher, SharedContext, WatchRoleGate};
//!
//! # async fn wire(coordination: Arc<dyn fleetd::CoordinationClient>,
//! #               protocol: Arc<dyn fleetd::SessionProtocol>,
//! #               plugins: Arc<fleetd::CapabilityRegistry>,
//! #               modules: Arc<fleetd::CapabilityRegistry>) -> fleetd::Result<()> {
//! let (role_tx, role_gate) = WatchRoleGate::channel(Default::default());
//! let context = SharedContext::new(coordination, plugins, modules);
//!
//! let dispatcher = SessionDispatcher::new(
//!     DispatcherConfig::for_namespace("fleet"),
//!     context,
//!     Arc::new(role_gate),
//!     protocol,
//! )?;
//! let poller = dispatcher.start_polling();
//!
//! // ... feed role transitions through role_tx; on process shutdown:
//! dispatcher.shutdown();
//! poller.await.ok();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod coord;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod registry;
pub mod testing;

pub use config::{DEFAULT_NAMESPACE, DispatcherConfig};
pub use context::SharedContext;
pub use coord::{CoordinationClient, RoleGate, WatchRoleGate};
pub use dispatcher::SessionDispatcher;
pub use error::{DispatchError, Result};
pub use fleetd_protocol::{CoordError, Role, SessionRef};
pub use handler::{HandlerHandle, SessionProtocol, StopSignal};
pub use registry::{Capability, CapabilityRegistry};
