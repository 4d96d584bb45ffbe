//! Runner notification trait.
//!
//! The runner reports lifecycle facts to whoever is listening (a
//! renderer frontend, a test harness) through this trait. The runner
//! never depends on what observers do with the notifications.

use crate::script::ScriptError;
use crate::state::ExecutionState;

/// Observer for runner lifecycle notifications.
///
/// | Notification | Fired when |
/// |--------------|-----------|
/// | `state_changed` | The execution state actually changes (idempotent transitions are silent) |
/// | `file_change_not_handled` | A source change arrived while auto-rerun is disabled |
/// | `script_compile_error` | The script failed to compile (not fired for runtime errors) |
///
/// Implementations must be cheap and non-blocking: notifications are
/// delivered synchronously from the runner loop thread.
pub trait RunnerEmitter: Send + Sync {
    /// The execution state changed to `state`.
    fn state_changed(&self, state: ExecutionState);

    /// A source file changed but auto-rerun is disabled; someone else
    /// should tell the user their view is stale.
    fn file_change_not_handled(&self);

    /// The script failed to compile. Carries the raw error; the run is
    /// abandoned (no retry) and the previous output stays visible.
    fn script_compile_error(&self, error: &ScriptError);
}

/// Emitter that discards all notifications.
///
/// Useful for embedders that only poll
/// [`ScriptRunner::is_running`](crate::ScriptRunner::is_running).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl RunnerEmitter for NoopEmitter {
    fn state_changed(&self, _state: ExecutionState) {}

    fn file_change_not_handled(&self) {}

    fn script_compile_error(&self, _error: &ScriptError) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_emitter_accepts_everything() {
        let emitter = NoopEmitter;
        emitter.state_changed(ExecutionState::Running);
        emitter.file_change_not_handled();
        emitter.script_compile_error(&ScriptError::Compile {
            path: "x.lua".into(),
            message: "oops".into(),
        });
    }
}
