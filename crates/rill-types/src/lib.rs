//! Core types for the rill runtime.
//!
//! This crate provides the foundational value types shared by every
//! layer of the rill (Re-runnable Interactive Live-script) runtime.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Value Layer                              │
//! │  (no runtime behavior, safe to depend on anywhere)          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  rill-types    : SessionId, ScriptInvocation, ErrorCode     │
//! │                  ◄── HERE                                    │
//! │  rill-event    : ControlEvent, ControlEventQueue, signals   │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Runtime Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  rill-runtime  : state machine, session context,            │
//! │                  script host, ScriptRunner                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Notes
//!
//! - Identifiers are UUID-based so sessions can be referenced across
//!   threads and (eventually) processes without coordination.
//! - [`ScriptInvocation`] is deliberately dumb data: the runtime carries
//!   it through queues and control signals without interpreting it; only
//!   the script host reads its fields.
//! - [`ErrorCode`] gives every error in the system a stable
//!   machine-readable code plus recoverability info, so callers can build
//!   retry logic without string-matching messages.

mod error;
mod id;
mod invocation;

pub use error::{validate_error_code, ErrorCode};
pub use id::SessionId;
pub use invocation::ScriptInvocation;
