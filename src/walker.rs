//! Directory walker for candidate image discovery.
//!
//! Produces a lazy stream of file paths under a root, filtered by the
//! configured extension allow-list. The same traversal doubles as the
//! counting pass for progress totals: [`FileWalker::count`] re-runs it with
//! identical filters, so the total always matches what the processing pass
//! would see at that moment.
//!
//! Filters here are advisory. A file can vanish between enumeration and
//! processing, so downstream stages must tolerate missing paths.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Lazy, restartable enumeration of candidate files under one root.
#[derive(Debug, Clone)]
pub struct FileWalker {
    root: PathBuf,
    recursive: bool,
    /// Normalized allow-list: lowercase, no leading dot. Empty = allow all.
    extensions: Vec<String>,
}

impl FileWalker {
    /// Create a walker for `root`.
    ///
    /// `extensions` entries are normalized (leading dot stripped, lowercased)
    /// so `".JPG"`, `"jpg"` and `".jpg"` configure the same filter.
    #[must_use]
    pub fn new(root: &Path, recursive: bool, extensions: &[String]) -> Self {
        Self {
            root: root.to_path_buf(),
            recursive,
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Whether a file name passes the extension allow-list.
    fn extension_matches(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| {
                let ext = e.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
    }

    /// Walk the root, yielding paths of files that exist and match the filter.
    ///
    /// With `recursive` false only the root's immediate children are visited;
    /// subdirectories are not descended into. Traversal errors are logged and
    /// skipped rather than ending the stream.
    pub fn files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        let max_depth = if self.recursive { usize::MAX } else { 1 };

        WalkDir::new(&self.root)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    log::warn!("walk error under {}: {}", self.root.display(), err);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(move |path| {
                if !self.extension_matches(path) {
                    log::trace!("extension filtered: {}", path.display());
                    return false;
                }
                // Advisory only; a concurrent actor may still delete it later.
                if !path.exists() {
                    log::debug!("vanished before processing: {}", path.display());
                    return false;
                }
                true
            })
    }

    /// Count the files the processing pass would currently yield.
    ///
    /// This is a fresh traversal, not a cached number; directory contents may
    /// legitimately differ between a count pass and a later processing pass.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.files().count() as u64
    }
}
