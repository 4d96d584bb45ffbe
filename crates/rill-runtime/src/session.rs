//! Session context and widget state.

use crate::sink::OutputSink;
use parking_lot::RwLock;
use rill_types::SessionId;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared, mutable widget state keyed by widget id.
///
/// Written only from the execution thread during a run; may be read
/// concurrently by controller threads between runs. Callers must not
/// assume visibility of in-progress mutations until a run completes.
///
/// Cloning is cheap; all clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct WidgetStates {
    inner: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl WidgetStates {
    /// Creates an empty widget state map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for a widget id, if set.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<serde_json::Value> {
        self.inner.read().get(id).cloned()
    }

    /// Sets the value for a widget id.
    pub fn set(&self, id: impl Into<String>, value: serde_json::Value) {
        self.inner.write().insert(id.into(), value);
    }

    /// Returns a snapshot of all widget values.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, serde_json::Value> {
        self.inner.read().clone()
    }

    /// Returns the number of widgets with a stored value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` when no widget values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Immutable-after-creation context identifying a session.
///
/// A `SessionContext` bundles the collaborators every unit of work in a
/// session needs: the root [`OutputSink`] and the session's
/// [`WidgetStates`]. It is attached to threads via the
/// [`ThreadContextRegistry`](crate::ThreadContextRegistry) so nested
/// work, including work on other threads, can discover which session
/// it belongs to and route output there instead of to a stale or
/// unrelated one.
///
/// Cloning is cheap (all fields are Arc-backed) and every clone refers
/// to the same session. The registry never extends the session's
/// lifetime; holders of stale clones keep a working but disconnected
/// sink, which is an accepted risk.
#[derive(Clone)]
pub struct SessionContext {
    id: SessionId,
    sink: Arc<dyn OutputSink>,
    widgets: WidgetStates,
}

impl SessionContext {
    /// Creates a context for a new session.
    #[must_use]
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self {
            id: SessionId::new(),
            sink,
            widgets: WidgetStates::new(),
        }
    }

    /// Creates a context with pre-existing widget state.
    #[must_use]
    pub fn with_widgets(sink: Arc<dyn OutputSink>, widgets: WidgetStates) -> Self {
        Self {
            id: SessionId::new(),
            sink,
            widgets,
        }
    }

    /// Returns the session's identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the session's root output sink.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn OutputSink> {
        &self.sink
    }

    /// Returns a handle to the session's widget state.
    #[must_use]
    pub fn widgets(&self) -> &WidgetStates {
        &self.widgets
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("id", &self.id)
            .field("widgets", &self.widgets.len())
            .finish_non_exhaustive()
    }
}
