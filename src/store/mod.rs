//! Signature store: perceptual signatures plus per-file metadata.
//!
//! The engine only ever talks to the [`SignatureStore`] trait. The shipped
//! implementation is [`HashIndexStore`], an in-process BK-tree index over
//! perceptual hashes; anything that can answer similarity queries within a
//! configured distance can stand in for it.

pub mod hash_index;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use hash_index::HashIndexStore;

/// Metadata stored alongside a file's perceptual signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureMetadata {
    /// File size in bytes at analysis time.
    pub file_size: u64,
    /// Last modification time at analysis time.
    pub modified: SystemTime,
    /// Set true only after a successful, non-dry-run resolution of this path.
    pub already_deduplicated: bool,
}

/// Partial metadata update for [`SignatureStore::update`].
///
/// Unset fields are left untouched by the merge.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataPatch {
    pub file_size: Option<u64>,
    pub modified: Option<SystemTime>,
    pub already_deduplicated: Option<bool>,
}

impl MetadataPatch {
    /// Patch that only flips the `already_deduplicated` flag.
    #[must_use]
    pub fn deduplicated(value: bool) -> Self {
        Self {
            already_deduplicated: Some(value),
            ..Self::default()
        }
    }
}

/// A similarity-search hit with a snapshot of its stored metadata.
#[derive(Debug, Clone)]
pub struct SimilarCandidate {
    /// Path of the stored entry.
    pub path: PathBuf,
    /// Normalized perceptual distance in `[0, 1]`; lower is more similar.
    pub distance: f64,
    /// The candidate's metadata as stored at query time.
    pub metadata: SignatureMetadata,
}

/// Errors raised by a signature store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No entry exists for the given path.
    #[error("no signature entry for {0}")]
    NotFound(PathBuf),

    /// The file could not be decoded as an image.
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Contract the deduplication engine requires from the signature index.
///
/// Implementations must tolerate concurrent calls on distinct keys; the
/// engine never issues concurrent operations on the same key within a stage.
pub trait SignatureStore: Send + Sync {
    /// Compute and store a signature plus initial metadata for `path`.
    ///
    /// Idempotent: an unchanged, already-stored file is left as-is
    /// (preserving its `already_deduplicated` flag); a changed file is
    /// re-indexed with the flag reset.
    fn add(&self, path: &Path) -> Result<(), StoreError>;

    /// Fetch the stored metadata for `path`.
    fn get(&self, path: &Path) -> Result<SignatureMetadata, StoreError>;

    /// All stored entries within the configured maximum distance of `path`'s
    /// signature, `path` itself included if present.
    fn search_similar(&self, path: &Path) -> Result<Vec<SimilarCandidate>, StoreError>;

    /// Merge the set fields of `patch` into the stored metadata for `path`.
    fn update(&self, path: &Path, patch: MetadataPatch) -> Result<(), StoreError>;

    /// Remove the entry for `path`. Removing an absent entry is not an error.
    fn remove(&self, path: &Path) -> Result<(), StoreError>;
}
