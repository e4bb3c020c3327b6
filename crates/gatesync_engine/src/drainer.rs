//! Queue drainer: ordered replay of pending actions.

use crate::error::{EngineError, EngineResult};
use crate::executor::ActionExecutor;
use gatesync_core::{ActionId, ActionQueue, EventBus, SyncEvent};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// The current state of the drainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    /// No pass is running.
    Idle,
    /// A pass is walking the queue.
    Draining,
    /// The last pass stopped at a failing action, which is still queued.
    Halted,
}

/// Detail of a halted pass: the first action that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainHalt {
    /// The failed action. It and everything after it remain queued.
    pub action_id: ActionId,
    /// The executor's failure description.
    pub reason: String,
}

/// Result of one drain pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Number of actions confirmed and removed in this pass.
    pub drained: u64,
    /// The halt detail if the pass stopped early.
    pub halted: Option<DrainHalt>,
    /// Duration of the pass.
    pub duration: Duration,
}

impl DrainOutcome {
    /// Returns true if the pass replayed everything it found.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.halted.is_none()
    }
}

/// Statistics across drain passes.
#[derive(Debug, Clone, Default)]
pub struct DrainStats {
    /// Passes that ran to the end of their list without halting.
    pub passes_completed: u64,
    /// Total actions confirmed and removed.
    pub actions_drained: u64,
    /// Passes that halted at a failing action.
    pub halts: u64,
    /// Failure description of the most recent halt.
    pub last_halt_reason: Option<String>,
}

/// Replays pending actions against the backend in strict order.
///
/// Semantics are at-least-once with stop-on-first-failure: an action is
/// removed only after the executor confirms it, and a failure stops the
/// pass so a later action can never be replayed ahead of an earlier one
/// that is still pending. A subsequent pass resumes from the head of
/// whatever remains.
///
/// At most one pass runs at a time. A concurrent [`QueueDrainer::drain`]
/// call blocks until the in-flight pass finishes, then runs its own pass
/// over the remaining tail - passes are serialized, never interleaved.
pub struct QueueDrainer {
    queue: Arc<ActionQueue>,
    bus: Arc<EventBus>,
    pass_lock: Mutex<()>,
    state: RwLock<DrainState>,
    stats: RwLock<DrainStats>,
    cancelled: AtomicBool,
}

impl QueueDrainer {
    /// Creates a drainer over the given queue and bus.
    pub fn new(queue: Arc<ActionQueue>, bus: Arc<EventBus>) -> Self {
        Self {
            queue,
            bus,
            pass_lock: Mutex::new(()),
            state: RwLock::new(DrainState::Idle),
            stats: RwLock::new(DrainStats::default()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> DrainState {
        *self.state.read()
    }

    /// Returns a copy of the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> DrainStats {
        self.stats.read().clone()
    }

    /// Requests cancellation of the in-flight pass.
    ///
    /// The pass stops before its next executor invocation; an action whose
    /// executor is already running is allowed to finish. Cancelled actions
    /// simply stay queued for a later pass.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Replays the queue through `executor`, in order, until the queue is
    /// empty or an action fails.
    ///
    /// A halt is *not* an `Err`: the pass worked as designed, and the halt
    /// detail travels in the returned [`DrainOutcome`] (and on the bus as
    /// [`SyncEvent::DrainHalted`]). A pass that replayed at least one
    /// action and halted nowhere publishes [`SyncEvent::SyncConfirmed`].
    ///
    /// # Errors
    ///
    /// Returns an error if queue storage fails mid-pass, or
    /// [`EngineError::Cancelled`] if [`QueueDrainer::cancel`] was called.
    /// Either way every already-confirmed action stays removed and the
    /// rest stay queued.
    pub fn drain(&self, executor: &dyn ActionExecutor) -> EngineResult<DrainOutcome> {
        let _pass = self.pass_lock.lock();
        let start = Instant::now();
        self.cancelled.store(false, Ordering::SeqCst);
        *self.state.write() = DrainState::Draining;

        let result = self.run_pass(executor);

        match &result {
            Ok(outcome) if outcome.halted.is_some() => *self.state.write() = DrainState::Halted,
            _ => *self.state.write() = DrainState::Idle,
        }

        result.map(|outcome| DrainOutcome {
            duration: start.elapsed(),
            ..outcome
        })
    }

    fn run_pass(&self, executor: &dyn ActionExecutor) -> EngineResult<DrainOutcome> {
        let actions = self.queue.list_ordered()?;
        let mut drained = 0u64;
        let mut halted = None;

        for action in &actions {
            if self.cancelled.load(Ordering::SeqCst) {
                info!(drained, "drain cancelled");
                return Err(EngineError::Cancelled);
            }

            match executor.execute(action) {
                Ok(()) => {
                    self.queue.remove(action.id)?;
                    drained += 1;
                }
                Err(reason) => {
                    warn!(action_id = %action.id, kind = %action.kind, %reason, "drain halted");
                    self.bus.publish(SyncEvent::DrainHalted {
                        action_id: action.id,
                        reason: reason.clone(),
                    });
                    halted = Some(DrainHalt {
                        action_id: action.id,
                        reason,
                    });
                    break;
                }
            }
        }

        {
            let mut stats = self.stats.write();
            stats.actions_drained += drained;
            match &halted {
                Some(halt) => {
                    stats.halts += 1;
                    stats.last_halt_reason = Some(halt.reason.clone());
                }
                None => {
                    stats.passes_completed += 1;
                    stats.last_halt_reason = None;
                }
            }
        }

        if halted.is_none() {
            info!(drained, "drain pass completed");
            if drained > 0 {
                self.bus.publish(SyncEvent::SyncConfirmed);
            }
        }

        Ok(DrainOutcome {
            drained,
            halted,
            duration: Duration::ZERO,
        })
    }
}
