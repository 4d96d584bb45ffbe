//! Script invocation payload.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything needed to (re-)execute a script.
///
/// An invocation is the unit of "what to run": it is created by the
/// caller (file watcher, widget handler, explicit user action), carried
/// through the control queue and, on a rerun-while-running, inside the
/// rerun control signal. The queue and runner treat it as opaque data;
/// only the script host reads its fields.
///
/// # Fields
///
/// | Field | Role |
/// |-------|------|
/// | `script_path` | Source file to compile and execute |
/// | `argv` | Argument vector exposed to the script (`arg` table) |
/// | `options` | Free-form extension slot, untouched by the core |
///
/// # Example
///
/// ```
/// use rill_types::ScriptInvocation;
///
/// let inv = ScriptInvocation::new("dashboard.lua")
///     .with_argv(vec!["--fast".into()]);
/// assert_eq!(inv.argv, vec!["--fast".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptInvocation {
    /// Path to the script source file.
    pub script_path: PathBuf,

    /// Argument vector the script sees during execution.
    #[serde(default)]
    pub argv: Vec<String>,

    /// Free-form options for external collaborators. The core carries
    /// this value and hands it back without interpreting it.
    #[serde(default)]
    pub options: serde_json::Value,
}

impl ScriptInvocation {
    /// Creates an invocation for a script path with empty argv.
    #[must_use]
    pub fn new(script_path: impl Into<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            argv: Vec::new(),
            options: serde_json::Value::Null,
        }
    }

    /// Sets the argument vector.
    #[must_use]
    pub fn with_argv(mut self, argv: Vec<String>) -> Self {
        self.argv = argv;
        self
    }

    /// Sets the free-form options value.
    #[must_use]
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    /// Returns the directory containing the script, if any.
    ///
    /// Used by the script host to scope the module search path to the
    /// script's own directory for the duration of a run.
    #[must_use]
    pub fn script_dir(&self) -> Option<&Path> {
        self.script_path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let inv = ScriptInvocation::new("/tmp/app.lua")
            .with_argv(vec!["a".into(), "b".into()])
            .with_options(serde_json::json!({"theme": "dark"}));

        assert_eq!(inv.script_path, PathBuf::from("/tmp/app.lua"));
        assert_eq!(inv.argv.len(), 2);
        assert_eq!(inv.options["theme"], "dark");
    }

    #[test]
    fn script_dir_of_absolute_path() {
        let inv = ScriptInvocation::new("/srv/scripts/app.lua");
        assert_eq!(inv.script_dir(), Some(Path::new("/srv/scripts")));
    }

    #[test]
    fn script_dir_of_bare_name_is_none() {
        let inv = ScriptInvocation::new("app.lua");
        assert_eq!(inv.script_dir(), None);
    }

    #[test]
    fn serde_roundtrip() {
        let inv = ScriptInvocation::new("x.lua").with_argv(vec!["1".into()]);
        let json = serde_json::to_string(&inv).unwrap();
        let back: ScriptInvocation = serde_json::from_str(&json).unwrap();
        assert_eq!(inv, back);
    }

    #[test]
    fn argv_defaults_when_missing() {
        let inv: ScriptInvocation =
            serde_json::from_str(r#"{"script_path": "y.lua"}"#).unwrap();
        assert!(inv.argv.is_empty());
        assert!(inv.options.is_null());
    }
}
