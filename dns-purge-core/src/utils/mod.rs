//! Utility modules.

/// Date/time serialization helpers for reports.
pub mod datetime;
