//! Cleanup stage: bottom-up removal of directories left empty by deletions.

use std::io::ErrorKind;
use std::path::Path;

use walkdir::WalkDir;

use crate::report::DeduplicationResult;

/// Remove every directory under `root` (root included) that is empty at
/// visit time.
///
/// Children are visited before their parents, so deleting a leaf directory
/// can cascade into its parent within the same sweep and no second scan is
/// needed. Directories deleted concurrently by another process are treated
/// as already absent.
pub(crate) fn remove_empty_dirs(root: &Path, dry_run: bool, result: &DeduplicationResult) {
    if !root.is_dir() {
        return;
    }

    for entry in WalkDir::new(root).contents_first(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                log::debug!("cleanup walk error under {}: {}", root.display(), err);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        if !is_empty_dir(path) {
            continue;
        }

        if dry_run {
            log::info!("DRY RUN: would remove empty folder {}", path.display());
        } else {
            match std::fs::remove_dir(path) {
                Ok(()) => log::info!("removed empty folder {}", path.display()),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    log::warn!("failed to remove folder {}: {}", path.display(), err);
                    continue;
                }
            }
        }
        result.add_removed_folder(path);
    }
}

/// True if the directory currently has zero entries. A directory that cannot
/// be read (vanished, permissions) is never reported empty.
fn is_empty_dir(path: &Path) -> bool {
    match std::fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => false,
    }
}
