//! Script host: compiles and executes one invocation in a fresh VM.
//!
//! Each run gets its own Lua state, so a script always starts from a
//! clean global namespace regardless of what previous runs defined.
//! The host installs a small session API into that namespace:
//!
//! | Global | Effect |
//! |--------|--------|
//! | `emit(value)` | Appends a produced element to the session's [`OutputSink`](crate::OutputSink) |
//! | `widget_value(id [, default])` | Reads a widget value from [`WidgetStates`](crate::WidgetStates) |
//! | `set_widget(id, value)` | Writes a widget value |
//! | `arg` | `arg[0]` = script path, `arg[1..]` = the invocation's argv |
//!
//! For the duration of the run the script's own directory is prepended
//! to `package.path`, so `require` resolves the script's sibling
//! modules first; the modification is reverted on every exit path.

mod convert;
mod error;
pub mod preempt;

pub use error::ScriptError;
pub use preempt::{extract_control_signal, Preemptor};

use crate::config::RunnerConfig;
use crate::session::SessionContext;
use crate::sink::OutputElement;
use mlua::{Lua, Table, Value};
use rill_event::ControlSignal;
use rill_types::ScriptInvocation;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Source pre-processing hook, applied before compilation when
/// [`RunnerConfig::magic_rewrite`] is enabled.
///
/// What the rewrite does (expression capture, instrumentation, ...) is
/// opaque to the host; it only promises to hand the rewriter the raw
/// source and compile whatever comes back.
pub trait ScriptRewriter: Send + Sync {
    /// Rewrites `source` for `invocation`. Must return compilable
    /// source; a rewrite that breaks the script surfaces as an
    /// ordinary compile error.
    fn rewrite(&self, source: &str, invocation: &ScriptInvocation) -> String;
}

/// How a single script run ended.
///
/// Control signals and user errors arrive on the same VM error channel;
/// the host separates them here so the runner never has to inspect raw
/// VM errors.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The script body ran to the end.
    Completed,

    /// A stop (or shutdown) signal unwound the run. Nothing is
    /// surfaced to the session; stopping is not an error.
    Interrupted,

    /// A rerun signal unwound the run; carries the next invocation.
    RerunRequested(ScriptInvocation),

    /// The source could not be read or compiled. Nothing executed.
    CompileFailed(ScriptError),

    /// The script raised an uncaught runtime error, or the VM
    /// environment could not be prepared. Already routed to the
    /// session's sink as an error element where user-visible.
    Failed(ScriptError),
}

/// Compiles and executes scripts for a session.
///
/// Stateless between runs apart from configuration; all per-run state
/// lives in the fresh VM and the [`SessionContext`] handed to
/// [`run`](Self::run).
pub struct ScriptHost {
    config: RunnerConfig,
    rewriter: Option<Arc<dyn ScriptRewriter>>,
}

impl ScriptHost {
    /// Creates a host with no source rewriter.
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            rewriter: None,
        }
    }

    /// Creates a host with a source rewriter. The rewriter only runs
    /// when [`RunnerConfig::magic_rewrite`] is enabled.
    #[must_use]
    pub fn with_rewriter(config: RunnerConfig, rewriter: Arc<dyn ScriptRewriter>) -> Self {
        Self {
            config,
            rewriter: Some(rewriter),
        }
    }

    /// Executes one invocation to completion, interruption, or failure.
    ///
    /// Runs synchronously on the calling thread; the caller is
    /// responsible for state transitions and notifications around it.
    pub fn run(
        &self,
        invocation: &ScriptInvocation,
        ctx: &SessionContext,
        preemptor: &Preemptor,
    ) -> RunOutcome {
        let source = match std::fs::read_to_string(&invocation.script_path) {
            Ok(source) => source,
            Err(err) => {
                return RunOutcome::CompileFailed(ScriptError::Read {
                    path: invocation.script_path.clone(),
                    message: err.to_string(),
                });
            }
        };

        let source = match (&self.rewriter, self.config.magic_rewrite) {
            (Some(rewriter), true) => {
                trace!(path = %invocation.script_path.display(), "applying source rewrite");
                rewriter.rewrite(&source, invocation)
            }
            _ => source,
        };

        // Fresh VM per run: a clean global namespace every time.
        let lua = Lua::new();
        let chunk_name = invocation.script_path.display().to_string();
        let body = match lua.load(&source).set_name(&chunk_name).into_function() {
            Ok(body) => body,
            Err(err) => {
                return RunOutcome::CompileFailed(ScriptError::Compile {
                    path: invocation.script_path.clone(),
                    message: describe_vm_error(&err),
                });
            }
        };

        if let Err(err) = install_session_api(&lua, ctx) {
            return RunOutcome::Failed(ScriptError::Host {
                message: describe_vm_error(&err),
            });
        }
        if let Err(err) = install_arg_table(&lua, invocation) {
            return RunOutcome::Failed(ScriptError::Host {
                message: describe_vm_error(&err),
            });
        }

        if self.config.preemption.install {
            preemptor.install_hook(&lua, self.config.preemption.checkpoint_instructions);
        }

        let result = match invocation.script_dir() {
            Some(dir) => with_prepended_search_path(&lua, dir, || body.call::<()>(())),
            None => body.call::<()>(()),
        };

        lua.remove_hook();
        // Post-run reset is best effort; a GC failure never changes the
        // run outcome.
        if let Err(err) = lua.gc_collect() {
            debug!(error = %err, "post-run gc collection failed");
        }

        match result {
            Ok(()) => RunOutcome::Completed,
            Err(err) => match extract_control_signal(&err) {
                Some(ControlSignal::Stop) => RunOutcome::Interrupted,
                Some(ControlSignal::Rerun(next)) => RunOutcome::RerunRequested(next),
                None => {
                    let message = describe_vm_error(&err);
                    ctx.sink().append(OutputElement::Error {
                        message: message.clone(),
                    });
                    RunOutcome::Failed(ScriptError::Exec { message })
                }
            },
        }
    }
}

impl std::fmt::Debug for ScriptHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptHost")
            .field("config", &self.config)
            .field("rewriter", &self.rewriter.is_some())
            .finish()
    }
}

/// Installs the session API globals into the VM.
fn install_session_api(lua: &Lua, ctx: &SessionContext) -> mlua::Result<()> {
    let globals = lua.globals();

    let sink = Arc::clone(ctx.sink());
    let emit = lua.create_function(move |_, value: Value| {
        let json = convert::lua_to_json(value)?;
        sink.append(OutputElement::Value(json));
        Ok(())
    })?;
    globals.set("emit", emit)?;

    let widgets = ctx.widgets().clone();
    let widget_value =
        lua.create_function(move |lua, (id, default): (String, Option<Value>)| {
            match widgets.get(&id) {
                Some(json) => convert::json_to_lua(lua, &json),
                None => Ok(default.unwrap_or(Value::Nil)),
            }
        })?;
    globals.set("widget_value", widget_value)?;

    let widgets = ctx.widgets().clone();
    let set_widget = lua.create_function(move |_, (id, value): (String, Value)| {
        widgets.set(id, convert::lua_to_json(value)?);
        Ok(())
    })?;
    globals.set("set_widget", set_widget)?;

    Ok(())
}

/// Exposes the invocation's argv as the conventional `arg` table.
fn install_arg_table(lua: &Lua, invocation: &ScriptInvocation) -> mlua::Result<()> {
    let arg = lua.create_table()?;
    arg.set(0, invocation.script_path.display().to_string())?;
    for (i, value) in invocation.argv.iter().enumerate() {
        arg.set(i + 1, value.as_str())?;
    }
    lua.globals().set("arg", arg)
}

/// Prepends `dir` to `package.path` around `f`, reverting afterwards.
///
/// The revert runs whether `f` succeeded, was unwound by a control
/// signal, or failed. Both writes are raw so user metatables on
/// `package` cannot intercept them, and a revert failure never
/// replaces `f`'s own result (a control signal must survive intact).
fn with_prepended_search_path<R>(
    lua: &Lua,
    dir: &Path,
    f: impl FnOnce() -> mlua::Result<R>,
) -> mlua::Result<R> {
    let package: Table = lua.globals().get("package")?;
    let original: String = package.get("path")?;
    package.raw_set("path", format!("{}/?.lua;{original}", dir.display()))?;

    let result = f();

    if let Err(err) = package.raw_set("path", original) {
        debug!(error = %err, "failed to restore module search path");
    }
    result
}

/// Root-cause message for a VM error, unwrapping callback and context
/// layers the VM adds on the way up.
fn describe_vm_error(err: &mlua::Error) -> String {
    match err {
        mlua::Error::CallbackError { cause, .. } => describe_vm_error(cause),
        mlua::Error::WithContext { cause, .. } => describe_vm_error(cause),
        mlua::Error::RuntimeError(message) => message.clone(),
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
