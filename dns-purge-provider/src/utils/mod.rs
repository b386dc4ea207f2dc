//! Utility modules.

/// Log sanitization utilities to keep log lines bounded.
pub mod log_sanitizer;
