//! Source watcher bookkeeping hook.
//!
//! The filesystem watcher itself is an external collaborator: it
//! detects edits and calls
//! [`ScriptRunner::source_file_changed`](crate::ScriptRunner::source_file_changed).
//! This trait is the reverse direction: after every run the runner
//! tells the watcher which invocation just executed so it can refresh
//! its set of watched source files (scripts can load additional
//! modules, and the watch set must follow).

use rill_types::ScriptInvocation;

/// Post-run bookkeeping callback for an external source watcher.
pub trait SourceWatcher: Send + Sync {
    /// Called after each completed, stopped, or failed run (but not
    /// after a compile failure, which executes nothing new).
    fn update_watched_sources(&self, invocation: &ScriptInvocation);
}

/// Watcher that does nothing. For embedders without file watching.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWatcher;

impl SourceWatcher for NoopWatcher {
    fn update_watched_sources(&self, _invocation: &ScriptInvocation) {}
}
