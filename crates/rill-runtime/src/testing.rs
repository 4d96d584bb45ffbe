//! Recording test doubles for the runtime's collaborator traits.
//!
//! These live in the library (not `#[cfg(test)]`) so integration tests
//! and embedders' own test suites can use them. None of them block or
//! fail; they only record what the runtime did.

use crate::emitter::RunnerEmitter;
use crate::script::ScriptError;
use crate::sink::{OutputElement, OutputSink};
use crate::state::ExecutionState;
use crate::watch::SourceWatcher;
use parking_lot::Mutex;
use rill_types::ScriptInvocation;

/// [`OutputSink`] that records appended elements and numbering resets.
#[derive(Debug, Default)]
pub struct RecordingSink {
    elements: Mutex<Vec<OutputElement>>,
    resets: Mutex<usize>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every element appended so far, in order.
    #[must_use]
    pub fn elements(&self) -> Vec<OutputElement> {
        self.elements.lock().clone()
    }

    /// Returns how many times numbering was reset.
    #[must_use]
    pub fn reset_count(&self) -> usize {
        *self.resets.lock()
    }
}

impl OutputSink for RecordingSink {
    fn reset_numbering(&self) {
        *self.resets.lock() += 1;
    }

    fn append(&self, element: OutputElement) {
        self.elements.lock().push(element);
    }
}

/// [`RunnerEmitter`] that records every notification.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    states: Mutex<Vec<ExecutionState>>,
    unhandled_changes: Mutex<usize>,
    compile_errors: Mutex<Vec<String>>,
}

impl RecordingEmitter {
    /// Creates an empty recording emitter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state transitions observed, in order.
    #[must_use]
    pub fn states(&self) -> Vec<ExecutionState> {
        self.states.lock().clone()
    }

    /// Returns how many unhandled file changes were reported.
    #[must_use]
    pub fn unhandled_change_count(&self) -> usize {
        *self.unhandled_changes.lock()
    }

    /// Returns the display text of each reported compile error.
    #[must_use]
    pub fn compile_errors(&self) -> Vec<String> {
        self.compile_errors.lock().clone()
    }
}

impl RunnerEmitter for RecordingEmitter {
    fn state_changed(&self, state: ExecutionState) {
        self.states.lock().push(state);
    }

    fn file_change_not_handled(&self) {
        *self.unhandled_changes.lock() += 1;
    }

    fn script_compile_error(&self, error: &ScriptError) {
        self.compile_errors.lock().push(error.to_string());
    }
}

/// [`SourceWatcher`] that records each bookkeeping callback.
#[derive(Debug, Default)]
pub struct RecordingWatcher {
    updates: Mutex<Vec<ScriptInvocation>>,
}

impl RecordingWatcher {
    /// Creates an empty recording watcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the invocations the runner reported, in order.
    #[must_use]
    pub fn updates(&self) -> Vec<ScriptInvocation> {
        self.updates.lock().clone()
    }
}

impl SourceWatcher for RecordingWatcher {
    fn update_watched_sources(&self, invocation: &ScriptInvocation) {
        self.updates.lock().push(invocation.clone());
    }
}
