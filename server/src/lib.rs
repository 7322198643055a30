//! Authoritative side of character movement: per-connection input admission, budgeted
//! re-simulation, divergence detection and snap-lock.

pub mod config;
pub mod host;
pub mod snap_lock;
pub mod validator;

pub use config::{ServerConfig, ValidatorConfig};
pub use host::{ConnectionId, MovementServer, Outgoing, ServerOutbox};
pub use snap_lock::SnapLock;
pub use validator::{Admission, ServerMovementValidator};
