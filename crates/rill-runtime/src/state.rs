//! Execution state machine.
//!
//! # State Machine
//!
//! ```text
//!            ┌─────────┐  rerun dequeued   ┌─────────┐
//!            │ Stopped │ ────────────────► │ Running │
//!            │         │ ◄──────────────── │         │
//!            └────┬────┘  completion /     └─────────┘
//!                 │       stop signal /
//!                 │       script error
//!                 │
//!                 │ shutdown processed while idle
//!                 ▼
//!            ┌──────────┐
//!            │ ShutDown │   (terminal)
//!            └──────────┘
//! ```
//!
//! The machine has exactly one writer: the runner loop thread. Other
//! threads only read (via [`ExecutionStateMachine::get`]) or request
//! transitions indirectly by enqueuing control events.

use crate::emitter::RunnerEmitter;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle state of a script session.
///
/// | From | To | Trigger |
/// |------|----|---------|
/// | Stopped | Running | Runner loop begins a dequeued rerun |
/// | Running | Stopped | Completion, stop signal, or uncaught error |
/// | Stopped | ShutDown | Shutdown event processed while idle |
///
/// `ShutDown` is terminal: no further transitions occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    /// A script body is executing on the runner loop thread.
    Running,
    /// The runner is idle, waiting for the next control event.
    Stopped,
    /// The runner loop has exited. Terminal.
    ShutDown,
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::ShutDown => "ShutDown",
        };
        f.write_str(name)
    }
}

/// Tracks the session's [`ExecutionState`] and notifies observers.
///
/// Writes happen only on the runner loop thread; reads may happen
/// anywhere. Same-state writes are no-ops and emit no notification
/// (idempotent `set`).
pub struct ExecutionStateMachine {
    state: RwLock<ExecutionState>,
    emitter: Arc<dyn RunnerEmitter>,
}

impl ExecutionStateMachine {
    /// Creates a state machine in [`ExecutionState::Stopped`].
    #[must_use]
    pub fn new(emitter: Arc<dyn RunnerEmitter>) -> Self {
        Self {
            state: RwLock::new(ExecutionState::Stopped),
            emitter,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn get(&self) -> ExecutionState {
        *self.state.read()
    }

    /// Returns `true` while a script body is executing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.get() == ExecutionState::Running
    }

    /// Returns `true` once the runner has shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.get() == ExecutionState::ShutDown
    }

    /// Transitions to `new_state`, notifying the emitter.
    ///
    /// Transitions to the current state are silent no-ops. Transition
    /// attempts out of the terminal `ShutDown` state are ignored with a
    /// warning; they indicate a caller holding a stale handle, not a
    /// recoverable condition.
    pub fn set(&self, new_state: ExecutionState) {
        {
            let mut state = self.state.write();
            if *state == new_state {
                return;
            }
            if *state == ExecutionState::ShutDown {
                warn!(attempted = %new_state, "ignoring transition out of terminal ShutDown");
                return;
            }
            debug!(from = %*state, to = %new_state, "execution state");
            *state = new_state;
        }
        // Notify outside the lock; observers may call back into reads.
        self.emitter.state_changed(new_state);
    }
}

impl std::fmt::Debug for ExecutionStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionStateMachine")
            .field("state", &self.get())
            .finish()
    }
}
