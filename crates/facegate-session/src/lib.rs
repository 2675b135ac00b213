//! Session negotiation and frame/answer streaming between facegate nodes.
//!
//! A session carries exactly one negotiation message, then an unbounded,
//! strictly alternating sequence of frames (client → server) and one-byte
//! answers (server → client). Connect or accept, negotiate once, then
//! stream.

pub mod answer;
pub mod connector;
pub mod error;
pub mod listener;
pub mod negotiate;
pub mod session;
pub mod stop;

pub use answer::{decode_answer, encode_answer, ANSWER_DENY, ANSWER_GRANT};
pub use connector::{connect, connect_with_config, GateSession};
pub use error::{Result, SessionError};
pub use listener::SessionListener;
pub use negotiate::{NegotiatedShape, NEGOTIATION_SIZE};
pub use session::{Role, Session, SessionConfig, SessionState};
pub use stop::StopSignal;
