//! Identifier types for rill.
//!
//! All identifiers are UUID-based so they stay unique without any
//! central coordination and serialize cleanly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a session.
///
/// A session is one logical user interaction context: it owns one output
/// sink and one set of widget state, and has exactly one runner loop
/// thread driving script executions on its behalf.
///
/// # Example
///
/// ```
/// use rill_types::SessionId;
///
/// let a = SessionId::new();
/// let b = SessionId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session ID (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
