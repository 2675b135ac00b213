//! The two network loops of a facegate installation.
//!
//! The camera node ([`run_client`]) streams frames to the decision node
//! ([`run_server`]) and unlocks the door on every grant. Both loops run
//! synchronously on the calling thread and stop on end of input, peer
//! close, a [`StopSignal`](facegate_session::StopSignal) or an error.

pub mod client;
pub mod error;
pub mod report;
pub mod server;

pub use client::{run_client, ClientConfig, UnlockTrigger};
pub use error::{NodeError, Result};
pub use report::{LoopReport, StopReason};
pub use server::{run_server, serve_session, Decide};
