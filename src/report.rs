//! Run outcome accumulation and reporting.
//!
//! [`DeduplicationResult`] collects removed files, removed folders and the
//! per-reference duplicate sets. Writes originate from worker-pool threads,
//! so the interior is mutex-protected; the rendering is deterministic
//! (everything is kept in ordered collections).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bytesize::ByteSize;
use serde::Serialize;

#[derive(Debug, Default)]
struct ResultInner {
    removed_files: BTreeSet<PathBuf>,
    removed_folders: BTreeSet<PathBuf>,
    duplicates: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    reclaimed_bytes: u64,
}

/// Thread-safe accumulator for one deduplication run.
#[derive(Debug, Default)]
pub struct DeduplicationResult {
    inner: Mutex<ResultInner>,
}

/// Serializable snapshot of a [`DeduplicationResult`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportSnapshot {
    /// Paths removed from disk (or that would be, in dry-run).
    pub removed_files: Vec<PathBuf>,
    /// Directories removed because they ended up empty.
    pub removed_folders: Vec<PathBuf>,
    /// Reference path -> paths identified as its duplicates.
    pub duplicates: BTreeMap<PathBuf, Vec<PathBuf>>,
    /// Total size of removed files in bytes.
    pub reclaimed_bytes: u64,
}

impl DeduplicationResult {
    /// Create an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ResultInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a file as removed, accounting `size` bytes as reclaimed.
    pub fn add_removed_file(&self, path: &Path, size: u64) {
        let mut inner = self.lock();
        if inner.removed_files.insert(path.to_path_buf()) {
            inner.reclaimed_bytes += size;
        }
    }

    /// Record a now-empty folder as removed.
    pub fn add_removed_folder(&self, path: &Path) {
        self.lock().removed_folders.insert(path.to_path_buf());
    }

    /// Record the full duplicate set found for `reference`.
    ///
    /// Called for every resolved file; an empty set is a valid value and
    /// means the file had no duplicates.
    pub fn set_file_duplicates(&self, reference: &Path, duplicates: BTreeSet<PathBuf>) {
        debug_assert!(
            !duplicates.contains(reference),
            "a file must never be its own duplicate"
        );
        self.lock()
            .duplicates
            .insert(reference.to_path_buf(), duplicates);
    }

    /// Number of removed files.
    #[must_use]
    pub fn removed_file_count(&self) -> usize {
        self.lock().removed_files.len()
    }

    /// Number of removed folders.
    #[must_use]
    pub fn removed_folder_count(&self) -> usize {
        self.lock().removed_folders.len()
    }

    /// Whether `path` was recorded as removed.
    #[must_use]
    pub fn is_file_removed(&self, path: &Path) -> bool {
        self.lock().removed_files.contains(path)
    }

    /// The duplicate set recorded for `reference`, if it was resolved.
    #[must_use]
    pub fn duplicates_of(&self, reference: &Path) -> Option<Vec<PathBuf>> {
        self.lock()
            .duplicates
            .get(reference)
            .map(|set| set.iter().cloned().collect())
    }

    /// Take a point-in-time snapshot for serialization.
    #[must_use]
    pub fn snapshot(&self) -> ReportSnapshot {
        let inner = self.lock();
        ReportSnapshot {
            removed_files: inner.removed_files.iter().cloned().collect(),
            removed_folders: inner.removed_folders.iter().cloned().collect(),
            duplicates: inner
                .duplicates
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
                .collect(),
            reclaimed_bytes: inner.reclaimed_bytes,
        }
    }

    /// Deterministic human-readable rendering of the run outcome.
    #[must_use]
    pub fn render_text(&self) -> String {
        let snap = self.snapshot();
        let mut out = String::new();

        let _ = writeln!(
            out,
            "Removed {} file(s), reclaiming {}",
            snap.removed_files.len(),
            ByteSize::b(snap.reclaimed_bytes)
        );
        for path in &snap.removed_files {
            let _ = writeln!(out, "  - {}", path.display());
        }

        let _ = writeln!(out, "Removed {} empty folder(s)", snap.removed_folders.len());
        for path in &snap.removed_folders {
            let _ = writeln!(out, "  - {}", path.display());
        }

        let with_dupes = snap.duplicates.iter().filter(|(_, v)| !v.is_empty());
        let _ = writeln!(out, "Duplicate sets:");
        let mut any = false;
        for (reference, dupes) in with_dupes {
            any = true;
            let _ = writeln!(out, "  {}", reference.display());
            for d in dupes {
                let _ = writeln!(out, "    = {}", d.display());
            }
        }
        if !any {
            let _ = writeln!(out, "  (none)");
        }

        out
    }

    /// JSON rendering of the run outcome.
    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}
