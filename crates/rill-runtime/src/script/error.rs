//! Script host errors.
//!
//! # Error Code Convention
//!
//! All script host errors use the `SCRIPT_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`ScriptError::Read`] | `SCRIPT_READ` | Yes |
//! | [`ScriptError::Compile`] | `SCRIPT_COMPILE` | Yes |
//! | [`ScriptError::Exec`] | `SCRIPT_EXEC` | Yes |
//! | [`ScriptError::Host`] | `SCRIPT_HOST` | No |
//!
//! Everything the user can fix by editing and saving again is
//! recoverable. `Host` covers failures setting up the VM environment
//! itself, which indicate an embedding bug rather than a script bug.
//!
//! Control signals are deliberately *not* represented here; they are
//! not errors (see [`rill_event::ControlSignal`]).

use rill_types::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// Error from compiling or executing a script.
#[derive(Debug, Clone, Error)]
pub enum ScriptError {
    /// The script source could not be read from disk.
    #[error("failed to read script {path}: {message}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error description.
        message: String,
    },

    /// The script failed to compile (syntax error).
    #[error("compile error in {path}: {message}")]
    Compile {
        /// Script path, for display in the error surface.
        path: PathBuf,
        /// Raw compiler message.
        message: String,
    },

    /// The script raised an uncaught runtime error.
    #[error("script error: {message}")]
    Exec {
        /// Raw runtime error message.
        message: String,
    },

    /// The host environment could not be prepared (VM setup failure).
    #[error("script host failure: {message}")]
    Host {
        /// Description of the setup step that failed.
        message: String,
    },
}

impl ErrorCode for ScriptError {
    fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "SCRIPT_READ",
            Self::Compile { .. } => "SCRIPT_COMPILE",
            Self::Exec { .. } => "SCRIPT_EXEC",
            Self::Host { .. } => "SCRIPT_HOST",
        }
    }

    fn is_recoverable(&self) -> bool {
        // User edits the script and saves again; Host failures need an
        // embedding fix.
        !matches!(self, Self::Host { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_types::validate_error_code;

    #[test]
    fn codes_follow_convention() {
        let variants = [
            ScriptError::Read {
                path: "a.lua".into(),
                message: "gone".into(),
            },
            ScriptError::Compile {
                path: "a.lua".into(),
                message: "syntax".into(),
            },
            ScriptError::Exec {
                message: "boom".into(),
            },
            ScriptError::Host {
                message: "no vm".into(),
            },
        ];
        for v in &variants {
            validate_error_code(v, "SCRIPT_");
        }
    }

    #[test]
    fn recoverability() {
        assert!(ScriptError::Compile {
            path: "a.lua".into(),
            message: String::new(),
        }
        .is_recoverable());
        assert!(!ScriptError::Host {
            message: String::new()
        }
        .is_recoverable());
    }

    #[test]
    fn display_includes_path() {
        let err = ScriptError::Compile {
            path: "bad.script".into(),
            message: "unexpected token".into(),
        };
        let text = err.to_string();
        assert!(text.contains("bad.script"));
        assert!(text.contains("unexpected token"));
    }
}
