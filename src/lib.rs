//! imgdedup - Perceptual Duplicate Image Remover
//!
//! Finds duplicate image files across directory trees using perceptual
//! similarity, keeps the best copy per a deterministic file-property policy
//! (largest, then oldest), removes the rest and cleans up directories left
//! empty by the removal.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod pool;
pub mod progress;
pub mod report;
pub mod store;
pub mod walker;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::{Cli, Commands, OutputFormat};
use crate::engine::Deduplicator;
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::store::HashIndexStore;

/// Run the application with parsed CLI arguments.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let quiet = cli.quiet;

    match cli.command {
        Commands::Analyze(args) => {
            let config = args.to_config();
            let store = Arc::new(HashIndexStore::new(config.max_distance));
            let engine = Deduplicator::new(config, store.clone())
                .with_progress(Arc::new(Progress::new(quiet)));

            engine.analyze()?;
            log::info!("analyzed {} file(s)", store.len());
            Ok(ExitCode::Success)
        }
        Commands::Dedup(args) => {
            let output = args.output;
            let config = args.to_config();
            let store = Arc::new(HashIndexStore::new(config.max_distance));
            let engine = Deduplicator::new(config, store)
                .with_progress(Arc::new(Progress::new(quiet)));

            let result = engine.deduplicate()?;

            match output {
                OutputFormat::Text => print!("{}", result.render_text()),
                OutputFormat::Json => println!("{}", result.render_json()?),
            }

            if result.removed_file_count() > 0 {
                Ok(ExitCode::Success)
            } else {
                Ok(ExitCode::NothingRemoved)
            }
        }
    }
}
