//! Stream transport for facegate nodes.
//!
//! Provides the connected byte stream both nodes talk over and the
//! startup-time transport selector:
//! - TCP (implemented)
//! - UDP (recognised by the selector, reported unsupported)
//!
//! This is the lowest layer of facegate. Everything else builds on top of
//! the [`GateStream`] type provided here.

pub mod error;
pub mod kind;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use kind::TransportKind;
pub use stream::GateStream;
pub use tcp::{connect, GateListener};
