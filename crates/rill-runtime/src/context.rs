//! Thread → session context registry.
//!
//! Any code running on a registered thread can discover "which session
//! am I part of" by asking the registry, so output produced by nested
//! units of work, including work spawned onto other threads, routes
//! to the correct live session.
//!
//! # Explicit Propagation
//!
//! Context never propagates implicitly. The spawning thread must make
//! the association before the child runs, either through
//! [`ThreadContextRegistry::spawn_with_context`] (preferred) or a
//! direct [`attach`](ThreadContextRegistry::attach). Background or
//! utility threads that were never attached legitimately have no
//! context: lookups return `None` and log a warning, and callers must
//! handle that by skipping attribution rather than failing.
//!
//! # Lifetime
//!
//! The registry holds plain clones of [`SessionContext`] and never
//! extends a session's lifetime. If the owning session has ended, a
//! lookup can return a context whose sink is disconnected, an
//! accepted, documented risk.

use crate::session::SessionContext;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::thread::{self, ThreadId};
use tracing::warn;

/// Process-wide association from threads to their session contexts.
///
/// This is an explicit object passed by reference to the components
/// that need it; there is no ambient global. Typically one registry
/// exists per process, shared by every [`ScriptRunner`](crate::ScriptRunner).
///
/// # Example
///
/// ```ignore
/// let registry = Arc::new(ThreadContextRegistry::new());
/// registry.attach_current(ctx.clone());
///
/// // Spawn a worker that inherits this thread's context.
/// let handle = registry.spawn_with_context("indexer", {
///     let registry = Arc::clone(&registry);
///     move || {
///         let ctx = registry.current().expect("attached by spawner");
///         // ... produce output for ctx.sink() ...
///     }
/// })?;
/// ```
#[derive(Debug, Default)]
pub struct ThreadContextRegistry {
    entries: RwLock<HashMap<ThreadId, SessionContext>>,
}

impl ThreadContextRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `ctx` for an arbitrary thread.
    ///
    /// Callers must ensure the target thread has not started consuming
    /// the context yet; for spawning workers, prefer
    /// [`spawn_with_context`](Self::spawn_with_context), which
    /// guarantees the attach happens before user code runs.
    pub fn attach(&self, thread: ThreadId, ctx: SessionContext) {
        self.entries.write().insert(thread, ctx);
    }

    /// Registers `ctx` for the calling thread.
    pub fn attach_current(&self, ctx: SessionContext) {
        self.attach(thread::current().id(), ctx);
    }

    /// Removes the registration for a thread, returning it if present.
    pub fn detach(&self, thread: ThreadId) -> Option<SessionContext> {
        self.entries.write().remove(&thread)
    }

    /// Removes the calling thread's registration.
    pub fn detach_current(&self) -> Option<SessionContext> {
        self.detach(thread::current().id())
    }

    /// Returns the context registered for a thread.
    ///
    /// Absence is a valid, observable state; no warning is logged
    /// here. Use [`current`](Self::current) for the logging variant.
    #[must_use]
    pub fn lookup(&self, thread: ThreadId) -> Option<SessionContext> {
        self.entries.read().get(&thread).cloned()
    }

    /// Returns the calling thread's context, warn-logging on absence.
    ///
    /// Threads that never belonged to a session (background utility
    /// threads) hit this path legitimately; callers must treat `None`
    /// as "skip session attribution", not as a failure.
    #[must_use]
    pub fn current(&self) -> Option<SessionContext> {
        let current = thread::current();
        let ctx = self.lookup(current.id());
        if ctx.is_none() {
            warn!(
                thread = current.name().unwrap_or("<unnamed>"),
                "thread has no session context"
            );
        }
        ctx
    }

    /// Spawns a thread carrying the calling thread's context.
    ///
    /// The calling thread's context (if any) is captured here and
    /// registered for the child before `f` runs, establishing the
    /// parent → child propagation chain. The registration is removed
    /// when `f` returns.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`std::io::Error`] if the OS refuses to
    /// spawn a thread.
    pub fn spawn_with_context<F, T>(
        self: &std::sync::Arc<Self>,
        name: impl Into<String>,
        f: F,
    ) -> std::io::Result<thread::JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let parent_ctx = self.lookup(thread::current().id());
        let registry = std::sync::Arc::clone(self);

        thread::Builder::new().name(name.into()).spawn(move || {
            if let Some(ctx) = parent_ctx {
                registry.attach_current(ctx);
            }
            let out = f();
            registry.detach_current();
            out
        })
    }

    /// Returns the number of registered threads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` when no threads are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;
    use std::sync::Arc;

    fn test_ctx() -> SessionContext {
        SessionContext::new(Arc::new(RecordingSink::new()))
    }

    #[test]
    fn attach_and_lookup_current() {
        let registry = ThreadContextRegistry::new();
        let ctx = test_ctx();

        registry.attach_current(ctx.clone());
        let found = registry.current().expect("context attached");
        assert_eq!(found.id(), ctx.id());

        registry.detach_current();
        assert!(registry.current().is_none());
    }

    #[test]
    fn unattached_thread_sees_none() {
        let registry = ThreadContextRegistry::new();
        assert!(registry.current().is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn spawned_child_inherits_context() {
        let registry = Arc::new(ThreadContextRegistry::new());
        let ctx = test_ctx();
        registry.attach_current(ctx.clone());

        let child_id = {
            let registry = Arc::clone(&registry);
            registry
                .clone()
                .spawn_with_context("child", move || {
                    registry.current().map(|c| c.id())
                })
                .unwrap()
                .join()
                .unwrap()
        };

        assert_eq!(child_id, Some(ctx.id()));
        registry.detach_current();
    }

    #[test]
    fn child_registration_removed_after_exit() {
        let registry = Arc::new(ThreadContextRegistry::new());
        registry.attach_current(test_ctx());

        registry
            .spawn_with_context("short-lived", || {})
            .unwrap()
            .join()
            .unwrap();

        // Only the parent registration remains.
        assert_eq!(registry.len(), 1);
        registry.detach_current();
    }

    #[test]
    fn spawn_without_parent_context_runs_detached() {
        let registry = Arc::new(ThreadContextRegistry::new());

        let child_ctx = {
            let inner = Arc::clone(&registry);
            registry
                .spawn_with_context("orphan", move || inner.current().is_none())
                .unwrap()
                .join()
                .unwrap()
        };

        assert!(child_ctx);
    }

    #[test]
    fn unrelated_thread_not_attached() {
        let registry = Arc::new(ThreadContextRegistry::new());
        registry.attach_current(test_ctx());

        // A plain spawn (not via the registry) carries nothing.
        let inner = Arc::clone(&registry);
        let got = std::thread::spawn(move || inner.current().is_none())
            .join()
            .unwrap();
        assert!(got);
        registry.detach_current();
    }
}
