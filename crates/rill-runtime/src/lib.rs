//! Re-runnable live script sessions.
//!
//! A *session* owns a user script that is executed, interrupted, and
//! re-executed many times as the user edits it or interacts with its
//! widgets, with each run's output replacing the last. This crate is
//! the runtime behind that loop.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ScriptRunner                          │
//! │   control requests → queue → loop thread → script runs       │
//! ├──────────────┬───────────────┬───────────────┬───────────────┤
//! │ state        │ session       │ context       │ script        │
//! │ Execution-   │ SessionContext│ ThreadContext-│ ScriptHost    │
//! │ StateMachine │ WidgetStates  │ Registry      │ Preemptor     │
//! ├──────────────┴───────────────┴───────────────┴───────────────┤
//! │ collaborator traits: OutputSink · RunnerEmitter ·            │
//! │                      SourceWatcher · ScriptRewriter          │
//! └──────────────────────────────────────────────────────────────┘
//!            ▲ rill-event (ControlEvent / ControlSignal)
//!            ▲ rill-types (SessionId / ScriptInvocation)
//! ```
//!
//! # Threading Model
//!
//! Each [`ScriptRunner`] owns one dedicated loop thread that both
//! drains control events and executes script bodies synchronously, so
//! at most one script body per session is ever running. All public
//! request methods are cheap, non-blocking enqueues from any thread. A
//! running script is interrupted cooperatively: a VM instruction-count
//! hook drains pending events and unwinds the run with a control
//! signal.
//!
//! # Example
//!
//! ```no_run
//! use rill_runtime::{
//!     NoopEmitter, NoopWatcher, RunnerConfig, ScriptRunner, SessionContext,
//!     ThreadContextRegistry,
//! };
//! use rill_types::ScriptInvocation;
//! use std::sync::Arc;
//!
//! # fn sink() -> Arc<dyn rill_runtime::OutputSink> { unimplemented!() }
//! let runner = ScriptRunner::new(
//!     SessionContext::new(sink()),
//!     Arc::new(ThreadContextRegistry::new()),
//!     RunnerConfig::default(),
//!     Arc::new(NoopEmitter),
//!     Arc::new(NoopWatcher),
//! )?;
//!
//! runner.request_rerun(ScriptInvocation::new("dashboard.lua"));
//! // ... later ...
//! runner.request_shutdown();
//! runner.join().unwrap();
//! # Ok::<(), std::io::Error>(())
//! ```

mod config;
mod context;
mod emitter;
mod runner;
mod session;
mod sink;
mod state;
mod watch;

pub mod script;
pub mod testing;

pub use config::{PreemptionConfig, RunnerConfig, DEFAULT_CHECKPOINT_INSTRUCTIONS};
pub use context::ThreadContextRegistry;
pub use emitter::{NoopEmitter, RunnerEmitter};
pub use runner::ScriptRunner;
pub use script::{Preemptor, RunOutcome, ScriptError, ScriptHost, ScriptRewriter};
pub use session::{SessionContext, WidgetStates};
pub use sink::{OutputElement, OutputSink};
pub use state::{ExecutionState, ExecutionStateMachine};
pub use watch::{NoopWatcher, SourceWatcher};
