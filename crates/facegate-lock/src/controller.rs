use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::actuator::{Actuator, LockState, LoggingActuator};

/// Timing of one unlock cycle.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// How long the door stays unlocked.
    pub dwell: Duration,
    /// Progress ticks emitted across the dwell period.
    pub ticks: u32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            dwell: Duration::from_secs(3),
            ticks: 20,
        }
    }
}

struct DoorInner {
    state: LockState,
    actuator: Box<dyn Actuator>,
}

/// The single physical door: its logical state, its actuator and the
/// guard that serializes access to both.
pub struct Door {
    inner: Mutex<DoorInner>,
    config: LockConfig,
    pending: AtomicUsize,
    completed: AtomicU64,
}

impl Door {
    pub fn new(actuator: impl Actuator + 'static, config: LockConfig) -> Self {
        Self {
            inner: Mutex::new(DoorInner {
                state: LockState::Locked,
                actuator: Box::new(actuator),
            }),
            config,
            pending: AtomicUsize::new(0),
            completed: AtomicU64::new(0),
        }
    }

    /// Door driven by [`LoggingActuator`].
    pub fn logging(config: LockConfig) -> Self {
        Self::new(LoggingActuator, config)
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Current logical state. Blocks while a cycle holds the guard.
    pub fn state(&self) -> LockState {
        self.guard().state
    }

    // A panicking actuator must not wedge the door shut forever.
    fn guard(&self) -> MutexGuard<'_, DoorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Door {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Door")
            .field("config", &self.config)
            .field("pending", &self.pending.load(Ordering::Relaxed))
            .field("completed", &self.completed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// Releases a pending slot even if the actuator panics.
struct PendingGuard<'a>(&'a AtomicUsize);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// Puts the logical state back to `Locked` when a cycle ends, including by panic.
struct RelockGuard<'a>(&'a mut LockState);

impl Drop for RelockGuard<'_> {
    fn drop(&mut self) {
        *self.0 = LockState::Locked;
    }
}

/// Runs unlock/dwell/relock cycles on a shared [`Door`].
#[derive(Debug, Clone)]
pub struct LockController {
    door: Arc<Door>,
}

impl LockController {
    pub fn new(door: Arc<Door>) -> Self {
        Self { door }
    }

    pub fn door(&self) -> &Arc<Door> {
        &self.door
    }

    /// Cycles waiting for or holding the door.
    pub fn pending(&self) -> usize {
        self.door.pending.load(Ordering::SeqCst)
    }

    /// Cycles finished since the door was created.
    pub fn completed(&self) -> u64 {
        self.door.completed.load(Ordering::SeqCst)
    }

    /// Unlock, dwell, relock. Blocks until the door is free.
    ///
    /// Returns `true` only if both actuations succeeded. The door is
    /// logically `Locked` again when this returns either way.
    pub fn unlock_and_relock(&self) -> bool {
        self.enqueue();
        self.run_queued()
    }

    /// Run [`Self::unlock_and_relock`] on its own thread.
    ///
    /// The cycle counts as pending from the moment this returns.
    pub fn spawn_cycle(&self) -> JoinHandle<bool> {
        self.enqueue();
        let controller = self.clone();
        thread::spawn(move || controller.run_queued())
    }

    fn enqueue(&self) {
        let queued = self.door.pending.fetch_add(1, Ordering::SeqCst) + 1;
        if queued > 1 {
            info!(queued, "unlock cycle queued behind another");
        }
    }

    fn run_queued(&self) -> bool {
        let _pending = PendingGuard(&self.door.pending);
        let ok = {
            let mut inner = self.door.guard();
            self.cycle(&mut inner)
        };
        self.door.completed.fetch_add(1, Ordering::SeqCst);
        ok
    }

    fn cycle(&self, inner: &mut DoorInner) -> bool {
        let DoorInner { state, actuator } = inner;
        let mut state = RelockGuard(state);

        let unlocked = match actuator.unlock() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "unlock failed");
                false
            }
        };
        *state.0 = LockState::Unlocked;

        self.dwell();

        let locked = match actuator.lock() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "relock failed");
                false
            }
        };
        drop(state);

        let ok = unlocked && locked;
        debug!(ok, "unlock cycle finished");
        ok
    }

    fn dwell(&self) {
        let dwell = self.door.config.dwell;
        let ticks = self.door.config.ticks.max(1);
        info!(?dwell, "holding door unlocked");
        let step = dwell / ticks;
        for tick in 1..=ticks {
            thread::sleep(step);
            debug!(tick, ticks, remaining = ?dwell.saturating_sub(step * tick), "dwell");
        }
        // Integer division may leave a remainder.
        let rest = dwell.saturating_sub(step * ticks);
        if !rest.is_zero() {
            thread::sleep(rest);
        }
    }
}
