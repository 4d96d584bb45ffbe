//! Control event types.

use rill_types::ScriptInvocation;
use serde::{Deserialize, Serialize};

/// A control request for a script session.
///
/// Control events are produced by any thread (UI callback, file
/// watcher, explicit user action) and consumed by exactly one runner
/// loop thread per session.
///
/// # Variants
///
/// | Kind | Payload | Effect |
/// |------|---------|--------|
/// | `Stop` | none | Stop the running script; runner stays alive |
/// | `Rerun` | [`ScriptInvocation`] | (Re-)execute the script |
/// | `Shutdown` | none | Stop any running script, then end the runner |
///
/// # Ordering
///
/// Events are observed by the consumer in enqueue order, with two
/// documented exceptions applied by [`ControlEventQueue`]
/// (crate::ControlEventQueue): `Shutdown` jumps to the consuming end,
/// and consecutive pending `Rerun`s coalesce into one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlEvent {
    /// Stop the script, but keep the runner alive.
    Stop,

    /// Run (or re-run) the script described by the invocation.
    ///
    /// The payload is opaque to the queue and runner loop; only the
    /// script host interprets it.
    Rerun(ScriptInvocation),

    /// Shut the runner down, stopping any running script first.
    Shutdown,
}

impl ControlEvent {
    /// Returns `true` for [`ControlEvent::Rerun`].
    #[must_use]
    pub fn is_rerun(&self) -> bool {
        matches!(self, Self::Rerun(_))
    }

    /// Returns a short name for logging.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Stop => "Stop",
            Self::Rerun(_) => "Rerun",
            Self::Shutdown => "Shutdown",
        }
    }
}

impl std::fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rerun(inv) => write!(f, "Rerun({})", inv.script_path.display()),
            other => f.write_str(other.kind_name()),
        }
    }
}
