//! Engine configuration and fatal-before-start validation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default extension allow-list, matching the formats worth deduplicating.
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Default normalized maximum perceptual distance.
///
/// 0.15 of a 64-bit hash is ~10 bits, the usual pHash tolerance.
pub const DEFAULT_MAX_DISTANCE: f64 = 0.15;

/// Default worker-pool size. Kept modest to avoid disk thrashing.
pub const DEFAULT_THREADS: usize = 4;

/// Configuration for one deduplication run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Root directories to process, in order.
    pub roots: Vec<PathBuf>,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Extension allow-list (case-insensitive). Empty allows all extensions.
    pub extensions: Vec<String>,
    /// Maximum normalized perceptual distance in `[0, 1]`.
    pub max_distance: f64,
    /// Worker-pool size per (root x stage).
    pub threads: usize,
    /// Simulate all bookkeeping without touching disk or index.
    pub dry_run: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            recursive: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            max_distance: DEFAULT_MAX_DISTANCE,
            threads: DEFAULT_THREADS,
            dry_run: false,
        }
    }
}

/// Configuration errors. These are fatal and surface before any processing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no root directories configured")]
    NoRoots,

    #[error("root is not a directory: {0}")]
    RootNotADirectory(PathBuf),

    #[error("similarity threshold must be a finite value in [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("worker-pool size must be at least 1")]
    NoWorkers,
}

impl DedupConfig {
    /// Validate the configuration before a run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::NoRoots);
        }
        for root in &self.roots {
            if !root.is_dir() {
                return Err(ConfigError::RootNotADirectory(root.clone()));
            }
        }
        if !self.max_distance.is_finite() || !(0.0..=1.0).contains(&self.max_distance) {
            return Err(ConfigError::InvalidThreshold(self.max_distance));
        }
        if self.threads == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }
}
