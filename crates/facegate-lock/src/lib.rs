//! Door lock control for the camera node.
//!
//! One [`Door`] owns the lock state and the actuator. A [`LockController`]
//! runs unlock, dwell, relock cycles on it, one at a time, usually on a
//! background thread so the network loop never waits for the door.

pub mod actuator;
pub mod controller;
pub mod error;

pub use actuator::{Actuator, CommandActuator, LockState, LoggingActuator};
pub use controller::{Door, LockConfig, LockController};
pub use error::{LockError, Result};
