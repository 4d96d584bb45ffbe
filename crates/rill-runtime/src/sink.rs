//! Output sink contract.
//!
//! The renderer that displays produced elements lives outside this
//! core; the runtime only needs an append-style surface to push
//! elements through, plus a per-run numbering reset so a rerun's
//! elements replace the previous run's in place.

use serde::{Deserialize, Serialize};

/// One element produced by a script run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutputElement {
    /// An ordinary produced value.
    Value(serde_json::Value),

    /// A visible error element for an uncaught execution failure.
    ///
    /// Routed through the sink like any other element so the failure
    /// shows up inside the session's output, not as a runner failure.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

impl OutputElement {
    /// Returns `true` for [`OutputElement::Error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Receiving end for elements produced during a run.
///
/// Implemented by the external renderer. Written to only from the
/// execution thread during a run.
pub trait OutputSink: Send + Sync {
    /// Resets per-run element numbering. Called at the start of every
    /// run, before the first element, so reruns overwrite in place.
    fn reset_numbering(&self);

    /// Appends one produced element to the live session.
    fn append(&self, element: OutputElement);
}
