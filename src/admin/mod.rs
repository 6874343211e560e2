#![forbid(unsafe_code)]

//! Store inspection utilities.
//!
//! Statistics and verification open their own read-only connection and never
//! modify the store.

mod stats;
mod verify;

/// Statistics collection and reporting.
///
/// Row counts per table, view presence, the load marker, and file sizes.
pub use stats::{stats, FilesystemStats, LoadStats, StatsReport, TableStats, ViewStats};

/// Store integrity verification.
///
/// Verifies relations, foreign keys, and natural-key uniqueness.
pub use verify::{verify, VerifyFinding, VerifyLevel, VerifyReport, VerifySeverity};
