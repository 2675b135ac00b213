use std::fmt;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{LockError, Result};

/// Logical state of the door.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockState {
    #[default]
    Locked,
    Unlocked,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LockState::Locked => "locked",
            LockState::Unlocked => "unlocked",
        })
    }
}

/// Drives the physical lock.
pub trait Actuator: Send {
    fn unlock(&mut self) -> Result<()>;
    fn lock(&mut self) -> Result<()>;
}

/// Actuator for setups without hardware: only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingActuator;

impl Actuator for LoggingActuator {
    fn unlock(&mut self) -> Result<()> {
        info!("door unlocked");
        Ok(())
    }

    fn lock(&mut self) -> Result<()> {
        info!("door locked");
        Ok(())
    }
}

/// Actuator that runs one external command per transition.
#[derive(Debug, Clone)]
pub struct CommandActuator {
    unlock: Vec<String>,
    lock: Vec<String>,
}

impl CommandActuator {
    /// `unlock` and `lock` are argv vectors: program first.
    pub fn new(unlock: Vec<String>, lock: Vec<String>) -> Result<Self> {
        if unlock.is_empty() {
            return Err(LockError::EmptyCommand { action: "unlock" });
        }
        if lock.is_empty() {
            return Err(LockError::EmptyCommand { action: "lock" });
        }
        Ok(Self { unlock, lock })
    }

    /// Split whitespace-separated command lines into argv vectors.
    pub fn from_command_lines(unlock: &str, lock: &str) -> Result<Self> {
        let split = |s: &str| -> Vec<String> { s.split_whitespace().map(String::from).collect() };
        Self::new(split(unlock), split(lock))
    }
}

fn run(action: &'static str, argv: &[String]) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or(LockError::EmptyCommand { action })?;
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|source| LockError::Spawn {
            action,
            program: program.clone(),
            source,
        })?;
    debug!(action, program = %program, %status, "actuator command finished");
    if status.success() {
        Ok(())
    } else {
        Err(LockError::CommandFailed {
            action,
            program: program.clone(),
            status,
        })
    }
}

impl Actuator for CommandActuator {
    fn unlock(&mut self) -> Result<()> {
        run("unlock", &self.unlock)
    }

    fn lock(&mut self) -> Result<()> {
        run("lock", &self.lock)
    }
}
