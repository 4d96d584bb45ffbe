//! Unwinding control signals.
//!
//! A [`ControlSignal`] is the in-flight form of a control request: the
//! cooperative preemption checkpoint drains a pending [`ControlEvent`]
//! (crate::ControlEvent) from *inside* a running script and raises it
//! as a signal that unwinds exactly one execution up to the runner
//! boundary.
//!
//! # Not An Error
//!
//! Control signals are deliberate, expected interruptions. They
//! implement [`std::error::Error`] purely so they can travel through
//! the script engine's error channel (an `mlua` external error), the
//! only unwinding path through foreign VM frames. The runner boundary
//! extracts them by downcast and never reports them through any
//! user-visible error path.

use rill_types::ScriptInvocation;
use thiserror::Error;

/// An unwinding interruption raised inside running user code.
///
/// # Variants
///
/// | Signal | Unwind effect |
/// |--------|---------------|
/// | `Stop` | Current run ends silently; runner returns to idle |
/// | `Rerun` | Current run ends silently; payload runs next, same thread |
///
/// A shutdown request also unwinds as `Stop`; the preemption
/// checkpoint records the shutdown separately so the unwind path stays
/// uniform.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlSignal {
    /// Silently stop the current execution.
    #[error("script execution stop requested")]
    Stop,

    /// Silently stop the current execution and immediately run the
    /// carried invocation on the same thread.
    #[error("script rerun requested: {}", .0.script_path.display())]
    Rerun(ScriptInvocation),
}

impl ControlSignal {
    /// Returns `true` for [`ControlSignal::Rerun`].
    #[must_use]
    pub fn is_rerun(&self) -> bool {
        matches!(self, Self::Rerun(_))
    }
}
