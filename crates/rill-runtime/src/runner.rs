//! The runner: one session's control loop and execution thread.
//!
//! # Architecture
//!
//! ```text
//!  controller threads                      runner loop thread
//!  ──────────────────                      ──────────────────
//!  request_rerun ──┐
//!  request_stop ───┼──► ControlEventQueue ──► dequeue (blocking)
//!  request_shutdown┘         │                    │
//!                            │                    ├─ Stop while idle: no-op
//!                            │                    ├─ Shutdown: exit loop
//!                            │                    └─ Rerun: execute script
//!                            │                         │
//!                            └──── preemption hook ◄───┘
//!                                  (drains mid-run)
//! ```
//!
//! Exactly one thread per runner both drains the queue and executes
//! script bodies, so at most one script body is ever running for the
//! session. Requests are cheap, non-blocking enqueues from any thread.
//!
//! # Rerun Chaining
//!
//! A rerun that preempts a running script does not go back through the
//! queue: the interrupted run's cleanup completes and the next
//! invocation starts immediately on the same thread. Events that
//! arrived in between are consumed by the new run's checkpoints rather
//! than before it starts.

use crate::config::RunnerConfig;
use crate::context::ThreadContextRegistry;
use crate::emitter::RunnerEmitter;
use crate::script::{Preemptor, RunOutcome, ScriptHost, ScriptRewriter};
use crate::session::SessionContext;
use crate::state::{ExecutionState, ExecutionStateMachine};
use crate::watch::SourceWatcher;
use parking_lot::Mutex;
use rill_event::{ControlEvent, ControlEventQueue};
use rill_types::ScriptInvocation;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Drives one session: accepts control requests, runs scripts.
///
/// The loop thread is spawned at construction and runs until a
/// shutdown event is processed. After shutdown the runner stays usable
/// as a state handle; further requests are dropped with a warning.
pub struct ScriptRunner {
    queue: Arc<ControlEventQueue>,
    machine: Arc<ExecutionStateMachine>,
    emitter: Arc<dyn RunnerEmitter>,
    ctx: SessionContext,
    run_on_save: bool,
    last_invocation: Arc<Mutex<Option<ScriptInvocation>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ScriptRunner {
    /// Creates a runner and spawns its loop thread.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`std::io::Error`] if the OS refuses to
    /// spawn the loop thread.
    pub fn new(
        ctx: SessionContext,
        registry: Arc<ThreadContextRegistry>,
        config: RunnerConfig,
        emitter: Arc<dyn RunnerEmitter>,
        watcher: Arc<dyn SourceWatcher>,
    ) -> std::io::Result<Self> {
        Self::build(ctx, registry, config, emitter, watcher, None)
    }

    /// Like [`new`](Self::new), with a source rewriter for the host.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`std::io::Error`] if the OS refuses to
    /// spawn the loop thread.
    pub fn with_rewriter(
        ctx: SessionContext,
        registry: Arc<ThreadContextRegistry>,
        config: RunnerConfig,
        emitter: Arc<dyn RunnerEmitter>,
        watcher: Arc<dyn SourceWatcher>,
        rewriter: Arc<dyn ScriptRewriter>,
    ) -> std::io::Result<Self> {
        Self::build(ctx, registry, config, emitter, watcher, Some(rewriter))
    }

    fn build(
        ctx: SessionContext,
        registry: Arc<ThreadContextRegistry>,
        config: RunnerConfig,
        emitter: Arc<dyn RunnerEmitter>,
        watcher: Arc<dyn SourceWatcher>,
        rewriter: Option<Arc<dyn ScriptRewriter>>,
    ) -> std::io::Result<Self> {
        let queue = Arc::new(ControlEventQueue::new());
        let machine = Arc::new(ExecutionStateMachine::new(Arc::clone(&emitter)));
        let last_invocation = Arc::new(Mutex::new(None));
        let run_on_save = config.run_on_save;

        let host = match rewriter {
            Some(rewriter) => ScriptHost::with_rewriter(config, rewriter),
            None => ScriptHost::new(config),
        };

        let worker = RunnerLoop {
            queue: Arc::clone(&queue),
            machine: Arc::clone(&machine),
            emitter: Arc::clone(&emitter),
            watcher,
            host,
            ctx: ctx.clone(),
            registry,
            last_invocation: Arc::clone(&last_invocation),
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        };

        let handle = std::thread::Builder::new()
            .name(format!("rill-runner-{}", ctx.id()))
            .spawn(move || worker.run())?;

        Ok(Self {
            queue,
            machine,
            emitter,
            ctx,
            run_on_save,
            last_invocation,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Requests execution of `invocation`.
    ///
    /// Never blocks. If a rerun is already pending, its payload is
    /// replaced by this one; if a script is running, it is preempted at
    /// its next checkpoint.
    pub fn request_rerun(&self, invocation: ScriptInvocation) {
        self.enqueue(ControlEvent::Rerun(invocation));
    }

    /// Requests interruption of the current run. A no-op if nothing is
    /// running when the event is processed.
    pub fn request_stop(&self) {
        self.enqueue(ControlEvent::Stop);
    }

    /// Requests session teardown. Takes priority over pending stop and
    /// rerun events; the loop thread exits once it is processed.
    pub fn request_shutdown(&self) {
        self.enqueue(ControlEvent::Shutdown);
    }

    fn enqueue(&self, event: ControlEvent) {
        if self.machine.is_shut_down() {
            warn!(event = %event, "runner is shut down; dropping request");
            return;
        }
        self.queue.enqueue(event);
    }

    /// Returns `true` while a script body is executing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.machine.is_running()
    }

    /// Returns `true` once the loop thread has exited.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.machine.is_shut_down()
    }

    /// Returns the current execution state.
    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.machine.get()
    }

    /// Returns the session this runner drives.
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.ctx
    }

    /// Entry point for an external file watcher: a watched source file
    /// changed on disk.
    ///
    /// With `run_on_save` enabled this reruns the last invocation.
    /// Otherwise the change is reported via
    /// [`RunnerEmitter::file_change_not_handled`] so someone can tell
    /// the user their view is stale.
    pub fn source_file_changed(&self) {
        if !self.run_on_save {
            self.emitter.file_change_not_handled();
            return;
        }
        let last = self.last_invocation.lock().clone();
        match last {
            Some(invocation) => self.request_rerun(invocation),
            None => debug!("source change before first run; nothing to rerun"),
        }
    }

    /// Waits for the loop thread to exit. Returns immediately if it
    /// was already joined.
    ///
    /// # Errors
    ///
    /// Propagates a panic from the loop thread, like
    /// [`JoinHandle::join`].
    pub fn join(&self) -> std::thread::Result<()> {
        let handle = self.handle.lock().take();
        match handle {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ScriptRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRunner")
            .field("session", &self.ctx.id())
            .field("state", &self.machine.get())
            .finish_non_exhaustive()
    }
}

/// Everything the loop thread owns. Consumed by [`RunnerLoop::run`].
struct RunnerLoop {
    queue: Arc<ControlEventQueue>,
    machine: Arc<ExecutionStateMachine>,
    emitter: Arc<dyn RunnerEmitter>,
    watcher: Arc<dyn SourceWatcher>,
    host: ScriptHost,
    ctx: SessionContext,
    registry: Arc<ThreadContextRegistry>,
    last_invocation: Arc<Mutex<Option<ScriptInvocation>>>,
    shutdown_requested: Arc<AtomicBool>,
}

impl RunnerLoop {
    fn run(self) {
        self.registry.attach_current(self.ctx.clone());
        info!(session = %self.ctx.id(), "runner loop started");

        // Bound to this thread; checkpoints from other threads no-op.
        let preemptor = Preemptor::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.shutdown_requested),
        );

        // Loop invariant: state is Stopped at the top of each turn.
        loop {
            match self.queue.dequeue() {
                ControlEvent::Stop => {
                    debug!("stop requested while idle; ignoring");
                }
                ControlEvent::Shutdown => {
                    self.shutdown_requested.store(true, Ordering::SeqCst);
                }
                ControlEvent::Rerun(invocation) => {
                    self.execute_chain(invocation, &preemptor);
                }
            }
            if self.shutdown_requested.load(Ordering::SeqCst) {
                break;
            }
        }

        self.machine.set(ExecutionState::ShutDown);
        self.registry.detach_current();
        info!(session = %self.ctx.id(), "runner loop exited");
    }

    /// Executes an invocation, then any reruns it was preempted into,
    /// until a run ends without requesting another.
    fn execute_chain(&self, invocation: ScriptInvocation, preemptor: &Preemptor) {
        let mut next = Some(invocation);
        while let Some(invocation) = next {
            next = self.execute_one(invocation, preemptor);
        }
    }

    /// One run. Returns the chained invocation if a rerun preempted it.
    fn execute_one(
        &self,
        invocation: ScriptInvocation,
        preemptor: &Preemptor,
    ) -> Option<ScriptInvocation> {
        debug!(path = %invocation.script_path.display(), "starting run");
        self.ctx.sink().reset_numbering();
        self.machine.set(ExecutionState::Running);
        *self.last_invocation.lock() = Some(invocation.clone());

        let outcome = self.host.run(&invocation, &self.ctx, preemptor);

        if let RunOutcome::CompileFailed(error) = &outcome {
            // Nothing executed: report, go idle, and skip watcher
            // bookkeeping since the watch set cannot have changed.
            warn!(error = %error, "run abandoned");
            self.emitter.script_compile_error(error);
            self.machine.set(ExecutionState::Stopped);
            return None;
        }

        let next = match outcome {
            RunOutcome::Completed => {
                debug!(path = %invocation.script_path.display(), "run completed");
                None
            }
            RunOutcome::Interrupted => {
                debug!(path = %invocation.script_path.display(), "run interrupted");
                None
            }
            RunOutcome::RerunRequested(next) => Some(next),
            RunOutcome::Failed(error) => {
                // Already surfaced inside the session's output.
                warn!(error = %error, "run failed");
                None
            }
            RunOutcome::CompileFailed(_) => unreachable!("handled above"),
        };

        self.machine.set(ExecutionState::Stopped);
        self.watcher.update_watched_sources(&invocation);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingEmitter, RecordingSink, RecordingWatcher};
    use crate::watch::NoopWatcher;
    use std::time::Duration;

    fn spawn_runner(
        config: RunnerConfig,
    ) -> (ScriptRunner, Arc<RecordingSink>, Arc<RecordingEmitter>) {
        let sink = Arc::new(RecordingSink::new());
        let emitter = Arc::new(RecordingEmitter::new());
        let runner = ScriptRunner::new(
            SessionContext::new(sink.clone()),
            Arc::new(ThreadContextRegistry::new()),
            config,
            emitter.clone(),
            Arc::new(NoopWatcher),
        )
        .unwrap();
        (runner, sink, emitter)
    }

    fn script(dir: &tempfile::TempDir, name: &str, body: &str) -> ScriptInvocation {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        ScriptInvocation::new(path)
    }

    #[test]
    fn starts_idle_and_shuts_down() {
        let (runner, _sink, emitter) = spawn_runner(RunnerConfig::default());
        assert!(!runner.is_running());
        assert!(!runner.is_shut_down());

        runner.request_shutdown();
        runner.join().unwrap();

        assert!(runner.is_shut_down());
        assert_eq!(emitter.states(), vec![ExecutionState::ShutDown]);
    }

    #[test]
    fn requests_after_shutdown_are_dropped() {
        let (runner, _sink, _emitter) = spawn_runner(RunnerConfig::default());
        runner.request_shutdown();
        runner.join().unwrap();

        // No panic, no effect; the loop is gone.
        runner.request_stop();
        runner.request_rerun(ScriptInvocation::new("x.lua"));
        assert!(runner.is_shut_down());
    }

    #[test]
    fn join_twice_is_fine() {
        let (runner, _sink, _emitter) = spawn_runner(RunnerConfig::default());
        runner.request_shutdown();
        runner.join().unwrap();
        runner.join().unwrap();
    }

    #[test]
    fn file_change_without_run_on_save_notifies() {
        let (runner, _sink, emitter) = spawn_runner(RunnerConfig::default());

        runner.source_file_changed();
        runner.source_file_changed();

        assert_eq!(emitter.unhandled_change_count(), 2);
        runner.request_shutdown();
        runner.join().unwrap();
    }

    #[test]
    fn file_change_with_run_on_save_reruns_last_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let inv = script(&dir, "app.lua", "emit('ran')");

        let mut config = RunnerConfig::default();
        config.run_on_save = true;
        let (runner, sink, _emitter) = spawn_runner(config);

        runner.request_rerun(inv);
        wait_until(|| sink.elements().len() == 1);

        runner.source_file_changed();
        wait_until(|| sink.elements().len() == 2);

        runner.request_shutdown();
        runner.join().unwrap();
        assert_eq!(sink.reset_count(), 2);
    }

    #[test]
    fn watcher_skipped_on_compile_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bad = script(&dir, "bad.lua", "emit(((");
        let good = script(&dir, "good.lua", "emit(1)");

        let sink = Arc::new(RecordingSink::new());
        let emitter = Arc::new(RecordingEmitter::new());
        let watcher = Arc::new(RecordingWatcher::new());
        let runner = ScriptRunner::new(
            SessionContext::new(sink.clone()),
            Arc::new(ThreadContextRegistry::new()),
            RunnerConfig::default(),
            emitter.clone(),
            watcher.clone(),
        )
        .unwrap();

        runner.request_rerun(bad);
        wait_until(|| emitter.compile_errors().len() == 1);
        assert!(watcher.updates().is_empty());

        runner.request_rerun(good.clone());
        wait_until(|| !watcher.updates().is_empty());
        assert_eq!(watcher.updates(), vec![good]);

        runner.request_shutdown();
        runner.join().unwrap();
    }

    fn wait_until(cond: impl Fn() -> bool) {
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while !cond() {
            assert!(std::time::Instant::now() < deadline, "condition not met in time");
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}
