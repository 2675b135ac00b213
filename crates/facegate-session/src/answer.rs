use crate::error::{Result, SessionError};

/// Answer byte: keep the door locked.
pub const ANSWER_DENY: u8 = 0;
/// Answer byte: unlock the door.
pub const ANSWER_GRANT: u8 = 1;

/// Encode a decision as its answer byte.
pub fn encode_answer(grant: bool) -> u8 {
    if grant {
        ANSWER_GRANT
    } else {
        ANSWER_DENY
    }
}

/// Decode an answer byte. Anything other than 0 or 1 is a protocol error.
pub fn decode_answer(byte: u8) -> Result<bool> {
    match byte {
        ANSWER_DENY => Ok(false),
        ANSWER_GRANT => Ok(true),
        other => Err(SessionError::Protocol(format!(
            "invalid answer byte 0x{other:02x}"
        ))),
    }
}
