//! Cooperative preemption checkpoint.
//!
//! A running script is interrupted by *unwinding it from the inside*,
//! never by killing its thread: the [`Preemptor`] is consulted at a
//! high-frequency checkpoint (a VM instruction-count hook, or an
//! explicit call from a host harness), drains one pending control
//! event without blocking, and converts it into a [`ControlSignal`]
//! that unwinds the execution up to the runner boundary. User code
//! therefore always gets its own cleanup semantics before the
//! execution thread becomes free again.
//!
//! # Hot Path
//!
//! With no event pending, a checkpoint is one uncontended lock and one
//! empty pop. The checkpoint frequency is configured via
//! [`PreemptionConfig::checkpoint_instructions`](crate::PreemptionConfig):
//! fewer instructions between checkpoints means lower interruption
//! latency and higher overhead.
//!
//! # Known Limitation
//!
//! The signal rides the VM's error channel, so a script-level `pcall`
//! can observe and swallow it. This sits in the same family as the
//! accepted limitation that a script which never reaches a checkpoint
//! cannot be stopped at all.

use mlua::{HookTriggers, Lua, VmState};
use rill_event::{ControlEvent, ControlEventQueue, ControlSignal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::debug;

/// Drains control events from inside a running script.
///
/// Owned by the runner; one per session. Only the runner loop thread
/// (which is also the execution thread) may act on a checkpoint;
/// invocations from any other thread are no-ops, because concurrent
/// drains would allow two control signals to be in flight for one
/// session.
#[derive(Debug, Clone)]
pub struct Preemptor {
    queue: Arc<ControlEventQueue>,
    loop_thread: ThreadId,
    shutdown_requested: Arc<AtomicBool>,
}

impl Preemptor {
    /// Creates a preemptor bound to the calling thread.
    ///
    /// Must be called on the runner loop thread.
    #[must_use]
    pub fn new(queue: Arc<ControlEventQueue>, shutdown_requested: Arc<AtomicBool>) -> Self {
        Self {
            queue,
            loop_thread: thread::current().id(),
            shutdown_requested,
        }
    }

    /// Checkpoint: drain one pending control event, if any.
    ///
    /// - Empty queue, or called off the loop thread → `Ok(())`.
    /// - `Stop` → `Err(ControlSignal::Stop)`.
    /// - `Shutdown` → records the shutdown request, then
    ///   `Err(ControlSignal::Stop)` (the unwind path is uniform).
    /// - `Rerun` → `Err(ControlSignal::Rerun(payload))`.
    ///
    /// # Errors
    ///
    /// The `Err` cases above are control flow, not failures; callers
    /// inside the execution stack propagate them upward unmodified.
    pub fn check(&self) -> Result<(), ControlSignal> {
        if thread::current().id() != self.loop_thread {
            // Output helpers may run on worker threads; only the
            // execution thread may consume control events.
            return Ok(());
        }

        let Some(event) = self.queue.dequeue_nowait() else {
            return Ok(());
        };

        debug!(event = %event, "control event at checkpoint");
        match event {
            ControlEvent::Stop => Err(ControlSignal::Stop),
            ControlEvent::Shutdown => {
                self.shutdown_requested.store(true, Ordering::SeqCst);
                Err(ControlSignal::Stop)
            }
            ControlEvent::Rerun(invocation) => Err(ControlSignal::Rerun(invocation)),
        }
    }

    /// Installs this preemptor as an instruction-count hook on `lua`.
    ///
    /// The hook fires every `checkpoint_instructions` VM instructions
    /// and raises any drained event as an external error carrying the
    /// [`ControlSignal`], unwinding the current execution.
    pub fn install_hook(&self, lua: &Lua, checkpoint_instructions: u32) {
        let preemptor = self.clone();
        lua.set_hook(
            HookTriggers::new().every_nth_instruction(checkpoint_instructions),
            move |_lua, _debug| match preemptor.check() {
                Ok(()) => Ok(VmState::Continue),
                Err(signal) => Err(mlua::Error::external(signal)),
            },
        );
    }
}

/// Recovers a [`ControlSignal`] from a VM error, if one is inside.
///
/// The signal may be wrapped in callback/context layers added by the
/// VM on its way up the stack; walk the cause chain. Returns `None`
/// for ordinary script errors, which must take the user-visible error
/// path instead.
#[must_use]
pub fn extract_control_signal(err: &mlua::Error) -> Option<ControlSignal> {
    match err {
        mlua::Error::ExternalError(cause) => cause.downcast_ref::<ControlSignal>().cloned(),
        mlua::Error::CallbackError { cause, .. } => extract_control_signal(cause),
        mlua::Error::WithContext { cause, .. } => extract_control_signal(cause),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_types::ScriptInvocation;

    fn preemptor() -> (Preemptor, Arc<ControlEventQueue>, Arc<AtomicBool>) {
        let queue = Arc::new(ControlEventQueue::new());
        let flag = Arc::new(AtomicBool::new(false));
        let preemptor = Preemptor::new(Arc::clone(&queue), Arc::clone(&flag));
        (preemptor, queue, flag)
    }

    #[test]
    fn empty_queue_is_a_noop() {
        let (preemptor, _queue, _flag) = preemptor();
        assert!(preemptor.check().is_ok());
    }

    #[test]
    fn stop_event_raises_stop() {
        let (preemptor, queue, flag) = preemptor();
        queue.enqueue(ControlEvent::Stop);

        assert_eq!(preemptor.check(), Err(ControlSignal::Stop));
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn shutdown_event_records_and_raises_stop() {
        let (preemptor, queue, flag) = preemptor();
        queue.enqueue(ControlEvent::Shutdown);

        assert_eq!(preemptor.check(), Err(ControlSignal::Stop));
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn rerun_event_carries_payload() {
        let (preemptor, queue, _flag) = preemptor();
        queue.enqueue(ControlEvent::Rerun(ScriptInvocation::new("next.lua")));

        match preemptor.check() {
            Err(ControlSignal::Rerun(inv)) => {
                assert_eq!(inv.script_path.to_str(), Some("next.lua"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn off_thread_check_is_a_noop() {
        let (preemptor, queue, _flag) = preemptor();
        queue.enqueue(ControlEvent::Stop);

        let result = std::thread::spawn(move || preemptor.check())
            .join()
            .unwrap();

        // The foreign thread refused to drain; the event is untouched.
        assert!(result.is_ok());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn hook_unwinds_infinite_loop() {
        let (preemptor, queue, _flag) = preemptor();
        queue.enqueue(ControlEvent::Stop);

        let lua = Lua::new();
        preemptor.install_hook(&lua, 100);

        let err = lua
            .load("while true do end")
            .exec()
            .expect_err("loop must be unwound");
        assert_eq!(extract_control_signal(&err), Some(ControlSignal::Stop));
    }

    #[test]
    fn ordinary_script_error_is_not_a_signal() {
        let lua = Lua::new();
        let err = lua.load("error('boom')").exec().unwrap_err();
        assert_eq!(extract_control_signal(&err), None);
    }

    #[test]
    fn extraction_walks_context_layers() {
        let inner = mlua::Error::external(ControlSignal::Stop);
        let wrapped = mlua::Error::CallbackError {
            traceback: String::new(),
            cause: Arc::new(inner),
        };
        assert_eq!(
            extract_control_signal(&wrapped),
            Some(ControlSignal::Stop)
        );
    }
}
