//! Deduplication engine: analysis, resolution and cleanup over the
//! configured roots.
//!
//! Each stage opens a fresh worker pool per root directory and drains it
//! fully before moving on; pools are never shared across roots or stages.
//! Per-file failures are isolated inside the stage operations, so a run is
//! always a best-effort pass over everything discoverable.

mod analysis;
mod cleanup;
mod resolve;

use std::sync::Arc;

use crate::config::DedupConfig;
use crate::error::DedupError;
use crate::pool::WorkerPool;
use crate::progress::{NoProgress, ProgressCallback};
use crate::report::DeduplicationResult;
use crate::store::SignatureStore;
use crate::walker::FileWalker;

/// Orchestrates a deduplication run against a signature store.
pub struct Deduplicator {
    config: DedupConfig,
    store: Arc<dyn SignatureStore>,
    progress: Arc<dyn ProgressCallback>,
}

impl Deduplicator {
    /// Create an engine over `store` with no progress rendering.
    #[must_use]
    pub fn new(config: DedupConfig, store: Arc<dyn SignatureStore>) -> Self {
        Self {
            config,
            store,
            progress: Arc::new(NoProgress),
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// The configuration this engine runs with.
    #[must_use]
    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Analyze all roots: ensure every discovered file has a signature.
    pub fn analyze(&self) -> Result<(), DedupError> {
        self.config.validate()?;
        self.run_analysis()
    }

    /// Full run: analysis, then resolution, then empty-directory cleanup.
    pub fn deduplicate(&self) -> Result<DeduplicationResult, DedupError> {
        self.config.validate()?;
        self.run_analysis()?;

        let result = DeduplicationResult::new();

        for root in &self.config.roots {
            let walker = self.walker_for(root);
            log::info!("Processing '{}'", root.display());
            let total = walker.count();
            self.progress.on_phase_start("resolve", total);

            let pool = WorkerPool::new(self.config.threads)?;
            pool.run_each(walker.files(), |path| {
                // Accounting reflects "file considered", even for paths the
                // resolution skips.
                self.progress.on_progress(&path.to_string_lossy());
                resolve::resolve_file(
                    self.store.as_ref(),
                    &path,
                    self.config.dry_run,
                    &result,
                );
            });
            self.progress.on_phase_end("resolve");
        }

        for root in &self.config.roots {
            cleanup::remove_empty_dirs(root, self.config.dry_run, &result);
        }

        Ok(result)
    }

    fn run_analysis(&self) -> Result<(), DedupError> {
        for root in &self.config.roots {
            let walker = self.walker_for(root);
            log::info!("Counting files in '{}'", root.display());
            let total = walker.count();
            self.progress.on_phase_start("analyze", total);

            let pool = WorkerPool::new(self.config.threads)?;
            pool.run_each(walker.files(), |path| {
                // Same accounting as resolve: every considered file counts,
                // whether or not its analysis succeeds.
                self.progress.on_progress(&path.to_string_lossy());
                analysis::analyze_file(self.store.as_ref(), &path);
            });
            self.progress.on_phase_end("analyze");
        }
        Ok(())
    }

    fn walker_for(&self, root: &std::path::Path) -> FileWalker {
        FileWalker::new(root, self.config.recursive, &self.config.extensions)
    }
}
