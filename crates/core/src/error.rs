use fleetd_protocol::CoordError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DispatchError>;

#[derive(Debug, Error)]
pub enum DispatchError {
	/// Rejected before the polling loop starts; never produced by a running
	/// dispatcher.
	#[error("invalid dispatcher configuration: {0}")]
	Config(String),

	#[error(transparent)]
	Coordination(#[from] CoordError),

	/// Failure raised by a session-protocol implementation. Contained to the
	/// handler that produced it.
	#[error("session handler failed: {0}")]
	Handler(String),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}
