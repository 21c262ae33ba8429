//! Environment detection utilities.

use std::io::IsTerminal;

/// Check if stderr is a TTY.
#[must_use]
pub fn stderr_is_tty() -> bool {
    std::io::stderr().is_terminal()
}

/// Trimmed value of an environment variable; `None` when unset or blank.
#[must_use]
pub fn var_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Check if an environment variable is set to a truthy value (1, true, yes, on).
#[must_use]
pub fn is_truthy(key: &str) -> bool {
    var_nonempty(key).is_some_and(|v| {
        matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
    })
}
