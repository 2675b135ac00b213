//! Face recognition door gate.
//!
//! A camera node streams frames over TCP to a decision node, which matches
//! the faces it finds against allow and deny lists and answers grant or
//! deny. On a grant the camera node runs an unlock, dwell, relock cycle.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP stream and listener, selected by [`transport::TransportKind`]
//! - [`frame`]: frame type, payload codec and length-prefixed message I/O
//! - [`session`]: negotiation and strict frame/answer alternation
//! - [`decision`]: embedding matching, detectors, human fallback
//! - [`lock`]: serialized door cycles
//! - [`node`]: the camera and decision loops

/// Re-export transport types.
pub mod transport {
    pub use facegate_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use facegate_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use facegate_session::*;
}

/// Re-export decision types.
pub mod decision {
    pub use facegate_decision::*;
}

/// Re-export lock types.
pub mod lock {
    pub use facegate_lock::*;
}

/// Re-export node loops.
pub mod node {
    pub use facegate_node::*;
}
