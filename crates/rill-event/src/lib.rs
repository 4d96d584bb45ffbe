//! Control events for the rill runtime.
//!
//! This crate provides the control vocabulary spoken between the
//! threads that *request* things of a script session (UI callbacks,
//! file watchers, explicit user actions) and the single runner loop
//! thread that *does* them.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Value Layer                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  rill-types    : SessionId, ScriptInvocation, ErrorCode     │
//! │  rill-event    : ControlEvent, queue, ControlSignal ◄── HERE │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  rill-runtime  : ScriptRunner consumes this vocabulary      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Two Kinds of Message
//!
//! | Type | Travels via | Meaning |
//! |------|-------------|---------|
//! | [`ControlEvent`] | [`ControlEventQueue`] | "please stop / rerun / shut down" |
//! | [`ControlSignal`] | execution call stack | an in-flight run is being unwound |
//!
//! A `ControlEvent` is a request sitting in a mailbox. A
//! `ControlSignal` is what that request becomes once the cooperative
//! preemption checkpoint drains it *inside* a running script: an
//! unwinding interruption that travels up the execution call stack and
//! is caught only at the runner boundary. Control signals are
//! deliberate interruptions, never failures, and must never be
//! surfaced through user-facing error reporting.
//!
//! # Queue Semantics
//!
//! ```text
//!   producers (any thread)                consumer (loop thread)
//!   ──────────────────────                ──────────────────────
//!   enqueue(Stop)      ──►  ┌───────────────────┐
//!   enqueue(Rerun(a))  ──►  │  Stop  Rerun(b)   │  ──► dequeue()
//!   enqueue(Rerun(b))  ──►  └───────────────────┘
//!                              ▲ coalesced: the pending Rerun's
//!                                payload was replaced in place
//!
//!   enqueue(Shutdown)  ──►  inserted at the consuming end,
//!                           dequeued before anything older
//! ```

mod event;
mod queue;
mod signal;

pub use event::ControlEvent;
pub use queue::ControlEventQueue;
pub use signal::ControlSignal;

// Re-export for convenience
pub use rill_types::ScriptInvocation;
