//! BK-tree backed signature store over perceptual image hashes.
//!
//! Hashes are computed with `image_hasher`'s DCT/median configuration (pHash),
//! which is the most resilient of the common algorithms against re-encoding
//! and resizing. Similarity lookups go through a BK-tree keyed by Hamming
//! distance, so a query touches only the subtrees within tolerance instead of
//! every stored signature.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use bk_tree::{BKTree, Metric};
use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};

use super::{MetadataPatch, SignatureMetadata, SignatureStore, SimilarCandidate, StoreError};

/// Bit length of the perceptual hash (8x8 grid).
pub const HASH_BITS: u32 = 64;

/// Metric for comparing `ImageHash` values using Hamming distance.
#[derive(Default, Clone, Copy, Debug)]
struct HammingMetric;

impl Metric<ImageHash> for HammingMetric {
    fn distance(&self, a: &ImageHash, b: &ImageHash) -> u32 {
        a.dist(b)
    }

    fn threshold_distance(&self, a: &ImageHash, b: &ImageHash, threshold: u32) -> Option<u32> {
        let d = self.distance(a, b);
        if d <= threshold {
            Some(d)
        } else {
            None
        }
    }
}

struct StoredEntry {
    hash: ImageHash,
    meta: SignatureMetadata,
}

struct Inner {
    tree: BKTree<ImageHash, HammingMetric>,
    /// Live paths per hash. The BK-tree cannot delete nodes, so a removed
    /// entry leaves a tombstoned hash behind; queries filter through this map
    /// and never see it.
    by_hash: HashMap<ImageHash, BTreeSet<PathBuf>>,
    entries: HashMap<PathBuf, StoredEntry>,
}

/// In-process [`SignatureStore`] implementation.
pub struct HashIndexStore {
    hasher: Hasher,
    /// Maximum Hamming distance (in bits) for similarity hits.
    tolerance: u32,
    inner: RwLock<Inner>,
}

impl HashIndexStore {
    /// Create an empty store with the given normalized maximum distance.
    ///
    /// `max_distance` is the `[0, 1]` threshold from the configuration; it is
    /// converted to a bit tolerance against the 64-bit hash.
    #[must_use]
    pub fn new(max_distance: f64) -> Self {
        let tolerance = (max_distance * f64::from(HASH_BITS)).round() as u32;
        let hasher = HasherConfig::new()
            .hash_alg(HashAlg::Median)
            .preproc_dct()
            .to_hasher();

        Self {
            hasher,
            tolerance,
            inner: RwLock::new(Inner {
                tree: BKTree::new(HammingMetric),
                by_hash: HashMap::new(),
                entries: HashMap::new(),
            }),
        }
    }

    /// Number of live entries in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    /// Returns true if the store holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn compute_hash(&self, path: &Path) -> Result<ImageHash, StoreError> {
        let img = image::open(path).map_err(|source| StoreError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.hasher.hash_image(&img))
    }

    fn stat(path: &Path) -> Result<(u64, std::time::SystemTime), StoreError> {
        let meta = std::fs::metadata(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let modified = meta.modified().map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok((meta.len(), modified))
    }
}

impl SignatureStore for HashIndexStore {
    fn add(&self, path: &Path) -> Result<(), StoreError> {
        let (file_size, modified) = Self::stat(path)?;

        // Unchanged file: keep the existing entry so the dedup flag survives.
        {
            let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = inner.entries.get(path) {
                if entry.meta.file_size == file_size && entry.meta.modified == modified {
                    log::trace!("signature up to date: {}", path.display());
                    return Ok(());
                }
            }
        }

        // Hash outside the lock; decoding is the expensive part.
        let hash = self.compute_hash(path)?;

        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let inner = &mut *guard;
        if let Some(old) = inner.entries.remove(path) {
            if let Some(paths) = inner.by_hash.get_mut(&old.hash) {
                paths.remove(path);
                if paths.is_empty() {
                    inner.by_hash.remove(&old.hash);
                }
            }
        }

        match inner.by_hash.entry(hash.clone()) {
            std::collections::hash_map::Entry::Occupied(mut e) => {
                e.get_mut().insert(path.to_path_buf());
            }
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(BTreeSet::from([path.to_path_buf()]));
                inner.tree.add(hash.clone());
            }
        }

        inner.entries.insert(
            path.to_path_buf(),
            StoredEntry {
                hash,
                meta: SignatureMetadata {
                    file_size,
                    modified,
                    already_deduplicated: false,
                },
            },
        );
        Ok(())
    }

    fn get(&self, path: &Path) -> Result<SignatureMetadata, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .entries
            .get(path)
            .map(|e| e.meta)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn search_similar(&self, path: &Path) -> Result<Vec<SimilarCandidate>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let entry = inner
            .entries
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;

        let mut candidates = Vec::new();
        for (dist, hash) in inner.tree.find(&entry.hash, self.tolerance) {
            // Tombstoned hashes have no live paths left.
            let Some(paths) = inner.by_hash.get(hash) else {
                continue;
            };
            for p in paths {
                if let Some(stored) = inner.entries.get(p) {
                    candidates.push(SimilarCandidate {
                        path: p.clone(),
                        distance: f64::from(dist) / f64::from(HASH_BITS),
                        metadata: stored.meta,
                    });
                }
            }
        }
        Ok(candidates)
    }

    fn update(&self, path: &Path, patch: MetadataPatch) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let entry = inner
            .entries
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;

        if let Some(size) = patch.file_size {
            entry.meta.file_size = size;
        }
        if let Some(modified) = patch.modified {
            entry.meta.modified = modified;
        }
        if let Some(flag) = patch.already_deduplicated {
            entry.meta.already_deduplicated = flag;
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), StoreError> {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let inner = &mut *guard;
        if let Some(old) = inner.entries.remove(path) {
            if let Some(paths) = inner.by_hash.get_mut(&old.hash) {
                paths.remove(path);
                if paths.is_empty() {
                    inner.by_hash.remove(&old.hash);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn save_image(path: &Path, seed: u8) {
        let img = RgbImage::from_fn(32, 32, |x, y| {
            Rgb([
                seed.wrapping_add((x * 8) as u8),
                seed.wrapping_mul((y * 8) as u8),
                seed ^ ((x + y) as u8),
            ])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_add_and_get() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        save_image(&path, 1);

        let store = HashIndexStore::new(0.1);
        store.add(&path).unwrap();

        let meta = store.get(&path).unwrap();
        assert!(meta.file_size > 0);
        assert!(!meta.already_deduplicated);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing_entry() {
        let store = HashIndexStore::new(0.1);
        let err = store.get(Path::new("/nope.png")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_add_is_idempotent_and_preserves_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        save_image(&path, 1);

        let store = HashIndexStore::new(0.1);
        store.add(&path).unwrap();
        store
            .update(&path, MetadataPatch::deduplicated(true))
            .unwrap();

        // Re-adding an unchanged file must keep the flag.
        store.add(&path).unwrap();
        assert!(store.get(&path).unwrap().already_deduplicated);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_changed_file_resets_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        save_image(&path, 1);

        let store = HashIndexStore::new(0.1);
        store.add(&path).unwrap();
        store
            .update(&path, MetadataPatch::deduplicated(true))
            .unwrap();

        // Rewrite with different content and a different mtime.
        save_image(&path, 77);
        let new_time = filetime::FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&path, new_time).unwrap();

        store.add(&path).unwrap();
        assert!(!store.get(&path).unwrap().already_deduplicated);
    }

    #[test]
    fn test_search_includes_self() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        save_image(&path, 1);

        let store = HashIndexStore::new(0.1);
        store.add(&path).unwrap();

        let hits = store.search_similar(&path).unwrap();
        assert!(hits.iter().any(|c| c.path == path && c.distance == 0.0));
    }

    #[test]
    fn test_identical_pixels_match_across_formats() {
        let dir = tempdir().unwrap();
        let png = dir.path().join("a.png");
        let bmp = dir.path().join("a.bmp");
        save_image(&png, 9);
        save_image(&bmp, 9);

        let store = HashIndexStore::new(0.1);
        store.add(&png).unwrap();
        store.add(&bmp).unwrap();

        let hits = store.search_similar(&png).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().any(|c| c.path == bmp));
    }

    #[test]
    fn test_remove_is_idempotent_and_hides_entry() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        save_image(&a, 9);
        save_image(&b, 9);

        let store = HashIndexStore::new(0.1);
        store.add(&a).unwrap();
        store.add(&b).unwrap();

        store.remove(&b).unwrap();
        store.remove(&b).unwrap();

        let hits = store.search_similar(&a).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, a);
        assert!(matches!(store.get(&b), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_add_rejects_non_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not_an_image.png");
        std::fs::write(&path, b"plain text").unwrap();

        let store = HashIndexStore::new(0.1);
        let err = store.add(&path).unwrap_err();
        assert!(matches!(err, StoreError::Image { .. }));
        assert!(store.is_empty());
    }
}
