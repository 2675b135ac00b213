/// Errors from driving the physical lock.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("{action} command '{program}': {source}")]
    Spawn {
        action: &'static str,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{action} command '{program}' exited with {status}")]
    CommandFailed {
        action: &'static str,
        program: String,
        status: std::process::ExitStatus,
    },

    #[error("{action} command is empty")]
    EmptyCommand { action: &'static str },

    #[error("actuator: {0}")]
    Actuator(String),
}

pub type Result<T> = std::result::Result<T, LockError>;
