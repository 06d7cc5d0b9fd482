//! Command-line interface definitions for imgdedup.
//!
//! ```bash
//! # See what would be removed under ~/Pictures, recursively
//! imgdedup dedup -r --dry-run ~/Pictures
//!
//! # Actually remove duplicates across two trees, 8 workers
//! imgdedup dedup -r -t 8 ~/Pictures ~/Backups/Pictures
//!
//! # Only build the signature index
//! imgdedup analyze -r ~/Pictures
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{DedupConfig, DEFAULT_MAX_DISTANCE, DEFAULT_THREADS};

/// Perceptual duplicate image finder and remover.
///
/// Finds images that are the same picture (not the same bytes), keeps the
/// largest/oldest copy of each and removes the rest, then sweeps up
/// directories left empty.
#[derive(Debug, Parser)]
#[command(name = "imgdedup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress bars and all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build or refresh the signature index for the given roots
    Analyze(AnalyzeArgs),
    /// Find and remove duplicate images under the given roots
    Dedup(DedupArgs),
}

/// Walk and store options shared by both subcommands.
#[derive(Debug, Args)]
pub struct WalkArgs {
    /// Root directories to process, in order
    #[arg(value_name = "ROOT", required = true)]
    pub roots: Vec<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// File extensions to consider (repeatable, case-insensitive)
    #[arg(
        short = 'e',
        long = "extension",
        value_name = "EXT",
        default_values_t = ["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
    )]
    pub extensions: Vec<String>,

    /// Consider every file regardless of extension
    #[arg(long, conflicts_with = "extensions")]
    pub all_extensions: bool,

    /// Maximum normalized perceptual distance for two files to count as
    /// the same picture (0 = identical hash only, 1 = everything)
    #[arg(long, value_name = "DIST", default_value_t = DEFAULT_MAX_DISTANCE)]
    pub max_distance: f64,

    /// Worker threads per directory pass
    #[arg(short, long, value_name = "N", default_value_t = DEFAULT_THREADS)]
    pub threads: usize,
}

impl WalkArgs {
    fn to_config(&self, dry_run: bool) -> DedupConfig {
        DedupConfig {
            roots: self.roots.clone(),
            recursive: self.recursive,
            extensions: if self.all_extensions {
                Vec::new()
            } else {
                self.extensions.clone()
            },
            max_distance: self.max_distance,
            threads: self.threads,
            dry_run,
        }
    }
}

/// Arguments for the analyze subcommand.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub walk: WalkArgs,
}

impl AnalyzeArgs {
    /// Build the engine configuration for an analyze-only run.
    #[must_use]
    pub fn to_config(&self) -> DedupConfig {
        self.walk.to_config(false)
    }
}

/// Arguments for the dedup subcommand.
#[derive(Debug, Args)]
pub struct DedupArgs {
    #[command(flatten)]
    pub walk: WalkArgs,

    /// Simulate the run: record every decision, delete nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Output format for the final report
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl DedupArgs {
    /// Build the engine configuration for a deduplication run.
    #[must_use]
    pub fn to_config(&self) -> DedupConfig {
        self.walk.to_config(self.dry_run)
    }
}

/// Output format for the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// Machine-readable JSON for scripting
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_dedup_defaults() {
        let cli = Cli::try_parse_from(["imgdedup", "dedup", "/photos"]).unwrap();
        let Commands::Dedup(args) = cli.command else {
            panic!("expected dedup subcommand");
        };

        let config = args.to_config();
        assert_eq!(config.roots, vec![PathBuf::from("/photos")]);
        assert!(!config.recursive);
        assert!(!config.dry_run);
        assert_eq!(config.extensions, vec!["png", "jpg", "jpeg"]);
        assert_eq!(config.max_distance, DEFAULT_MAX_DISTANCE);
        assert_eq!(config.threads, DEFAULT_THREADS);
        assert_eq!(args.output, OutputFormat::Text);
    }

    #[test]
    fn test_cli_roots_are_required() {
        assert!(Cli::try_parse_from(["imgdedup", "dedup"]).is_err());
    }

    #[test]
    fn test_cli_extension_overrides_defaults() {
        let cli = Cli::try_parse_from([
            "imgdedup", "analyze", "-e", "webp", "-e", "bmp", "/photos",
        ])
        .unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze subcommand");
        };
        assert_eq!(args.to_config().extensions, vec!["webp", "bmp"]);
    }

    #[test]
    fn test_cli_all_extensions_clears_filter() {
        let cli =
            Cli::try_parse_from(["imgdedup", "dedup", "--all-extensions", "/photos"]).unwrap();
        let Commands::Dedup(args) = cli.command else {
            panic!("expected dedup subcommand");
        };
        assert!(args.to_config().extensions.is_empty());
    }

    #[test]
    fn test_cli_dry_run_and_output() {
        let cli = Cli::try_parse_from([
            "imgdedup", "dedup", "-n", "-o", "json", "-r", "-t", "8", "/a", "/b",
        ])
        .unwrap();
        let Commands::Dedup(args) = cli.command else {
            panic!("expected dedup subcommand");
        };

        let config = args.to_config();
        assert!(config.dry_run);
        assert!(config.recursive);
        assert_eq!(config.threads, 8);
        assert_eq!(config.roots.len(), 2);
        assert_eq!(args.output, OutputFormat::Json);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["imgdedup", "-q", "-v", "dedup", "/a"]).is_err());
    }
}
