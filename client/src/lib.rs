//! Client side of character movement: local prediction with replay-based reconciliation,
//! and delayed interpolation of remote entities.

pub mod config;
pub mod controller;
pub mod input;
pub mod interpolation;
pub mod movement_state;
pub mod transport;

pub use config::{ClientConfig, ClientMovementConfig, InterpolationConfig};
pub use controller::{ClientMovementController, PendingMove, ReconcileReport};
pub use input::MovementInput;
pub use interpolation::{RemoteInterpolationController, RemotePose, RemotePoseSample};
pub use movement_state::MovementState;
pub use transport::{MoveTransport, MovementListener};
