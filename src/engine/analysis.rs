//! Analysis stage: ensure every discovered file has a current signature.

use std::path::Path;

use crate::store::SignatureStore;

/// Ensure the store holds a current entry for `path`.
///
/// Failures (unreadable file, corrupt image, permission error) are logged
/// and swallowed here; one bad file must not stop the batch.
pub(crate) fn analyze_file(store: &dyn SignatureStore, path: &Path) {
    log::trace!("analyzing {}", path.display());
    if let Err(err) = store.add(path) {
        log::warn!("failed to analyze {}: {}", path.display(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{HashIndexStore, SignatureStore};
    use tempfile::tempdir;

    #[test]
    fn test_analyze_indexes_valid_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        image::RgbImage::new(16, 16).save(&path).unwrap();

        let store = HashIndexStore::new(0.1);
        analyze_file(&store, &path);
        assert!(store.get(&path).is_ok());
    }

    #[test]
    fn test_analyze_swallows_bad_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image at all").unwrap();

        let store = HashIndexStore::new(0.1);
        analyze_file(&store, &path);
        assert!(store.get(&path).is_err());
    }
}
