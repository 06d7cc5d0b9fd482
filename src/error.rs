//! Run-level errors and process exit codes.

use crate::config::ConfigError;
use crate::pool::PoolError;

/// Exit codes for the imgdedup binary.
///
/// - 0: run completed and removed (or, in dry-run, flagged) duplicates
/// - 1: fatal error before or during the run
/// - 2: run completed normally but nothing was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Run completed and duplicates were removed.
    Success = 0,
    /// An unexpected or fatal error occurred.
    GeneralError = 1,
    /// Run completed but no duplicates were removed.
    NothingRemoved = 2,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Fatal errors from the deduplication engine.
///
/// Per-file problems never surface here; they are logged and skipped at the
/// single-file operation boundary. Store errors are per-file by nature and
/// always handled there.
#[derive(Debug, thiserror::Error)]
pub enum DedupError {
    /// The configuration is unusable; the run never started.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A worker pool could not be constructed.
    #[error(transparent)]
    Pool(#[from] PoolError),
}
