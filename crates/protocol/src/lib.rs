//! Shared types for the fleetd coordination contract.
//!
//! This crate contains the serde-serializable types exchanged between the
//! coordination-service client and the dispatch subsystem. These types
//! represent the "contract layer" - fleet roles, listing failures, and the
//! identity of a registered CLI session.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond construction and serialization
//! - **1:1 with the coordination layout**: A session is a child entry under
//!   a fixed root node; nothing else is assumed about the store
//! - **Stable**: Changes only when the coordination contract changes
//!
//! The dispatch machinery built on top of these types lives in `fleetd-core`.

pub mod error;
pub mod role;
pub mod session;

pub use error::*;
pub use role::*;
pub use session::*;
