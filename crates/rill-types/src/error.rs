//! Unified error code conventions.
//!
//! Every error enum in the rill workspace implements [`ErrorCode`] so
//! embedders get machine-readable codes and recoverability information
//! without parsing display strings.
//!
//! # Error Code Convention
//!
//! - UPPER_SNAKE_CASE
//! - Prefixed with the owning domain (e.g. `"SCRIPT_"`)
//! - Stable across versions (changing a code is a breaking change)
//!
//! # Recoverability
//!
//! An error is **recoverable** if retrying the operation (or user
//! action, like fixing the script source) may succeed. A compile error
//! is recoverable: the user edits the file and saves again. An
//! invariant violation is not.

/// Trait for errors with machine-readable codes.
///
/// # Example
///
/// ```
/// use rill_types::ErrorCode;
///
/// #[derive(Debug)]
/// enum HostError {
///     Busy,
///     Corrupt,
/// }
///
/// impl ErrorCode for HostError {
///     fn code(&self) -> &'static str {
///         match self {
///             Self::Busy => "HOST_BUSY",
///             Self::Corrupt => "HOST_CORRUPT",
///         }
///     }
///
///     fn is_recoverable(&self) -> bool {
///         matches!(self, Self::Busy)
///     }
/// }
/// ```
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    ///
    /// UPPER_SNAKE_CASE, domain-prefixed, stable across versions.
    fn code(&self) -> &'static str;

    /// Returns whether the error is recoverable.
    ///
    /// - `true`: retry or user corrective action may succeed
    /// - `false`: retry will not help, requires a code/config change
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows rill conventions.
///
/// # Checks
///
/// 1. Code is not empty
/// 2. Code starts with the expected domain prefix
/// 3. Code is UPPER_SNAKE_CASE
///
/// # Panics
///
/// Panics with a descriptive message if validation fails. Intended for
/// use in tests over every variant of an error enum.
///
/// # Example
///
/// ```
/// use rill_types::{validate_error_code, ErrorCode};
///
/// #[derive(Debug)]
/// struct Timeout;
///
/// impl ErrorCode for Timeout {
///     fn code(&self) -> &'static str { "HOST_TIMEOUT" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// validate_error_code(&Timeout, "HOST_");
/// ```
pub fn validate_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");

    assert!(
        code.starts_with(expected_prefix),
        "error code '{code}' must start with prefix '{expected_prefix}'"
    );

    assert!(
        is_upper_snake_case(code),
        "error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

fn is_upper_snake_case(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
