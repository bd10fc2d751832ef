//! Uniform formatting for errors and warnings.

use std::fmt::Display;

/// Prefix an error message so every failure reads the same way on stderr.
pub fn error_message(msg: impl Display) -> String {
    format!("error: {}", msg)
}

/// Report a non-fatal finding.
pub fn warn(msg: impl Display) {
    log::warn!("{}", msg);
}
