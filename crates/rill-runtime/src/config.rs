//! Runner configuration.
//!
//! All types implement [`Default`] for compile-time fallback values and
//! serialize to TOML for file storage.

use serde::{Deserialize, Serialize};

/// Default preemption checkpoint interval, in VM instructions.
///
/// Lower values reduce interruption latency; higher values reduce hook
/// overhead on the hot path. 1000 instructions keeps stop latency well
/// under a millisecond for typical scripts.
pub const DEFAULT_CHECKPOINT_INSTRUCTIONS: u32 = 1_000;

/// Configuration for a [`ScriptRunner`](crate::ScriptRunner).
///
/// # Example
///
/// ```
/// use rill_runtime::RunnerConfig;
///
/// let config = RunnerConfig::default();
/// assert!(!config.run_on_save);
/// assert!(config.preemption.install);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Automatically rerun when a watched source file changes. When
    /// disabled, the change is surfaced via
    /// [`RunnerEmitter::file_change_not_handled`](crate::RunnerEmitter::file_change_not_handled)
    /// instead.
    pub run_on_save: bool,

    /// Apply the registered source rewriter before compilation. The
    /// rewrite itself is opaque to the core.
    pub magic_rewrite: bool,

    /// Cooperative preemption settings.
    pub preemption: PreemptionConfig,
}

impl RunnerConfig {
    /// Creates a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// Cooperative preemption settings.
///
/// The checkpoint interval is the tunable trade-off between hook
/// overhead and interruption latency: the hook fires once every
/// `checkpoint_instructions` VM instructions, and a pending stop or
/// rerun only takes effect at such a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreemptionConfig {
    /// Install the preemption hook around script execution. With this
    /// disabled, a running script cannot be interrupted before it
    /// completes on its own.
    pub install: bool,

    /// VM instructions between checkpoints.
    pub checkpoint_instructions: u32,
}

impl Default for PreemptionConfig {
    fn default() -> Self {
        Self {
            install: true,
            checkpoint_instructions: DEFAULT_CHECKPOINT_INSTRUCTIONS,
        }
    }
}
