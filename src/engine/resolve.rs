//! Resolution stage: per-file duplicate retrieval, survivor selection and
//! removal.
//!
//! The survivor policy keeps the larger file (less likely a re-encoded copy)
//! and, among equal sizes, the older one (assumed to be the original). A
//! candidate that is smaller but older, or larger but newer, is left alone by
//! this reference's pass; the converse decision is expected from that file's
//! own pass, since every file is scanned as a reference at least once per run.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use crate::report::DeduplicationResult;
use crate::store::{MetadataPatch, SignatureStore, SimilarCandidate, StoreError};

/// Resolve duplicates of `reference`, deleting losers (or simulating it).
///
/// Stale index entries discovered along the way (reference or candidate gone
/// from disk) are healed by removal and never surface as errors. The caller
/// accounts the progress increment before invoking this.
pub(crate) fn resolve_file(
    store: &dyn SignatureStore,
    reference: &Path,
    dry_run: bool,
    result: &DeduplicationResult,
) {
    // Idempotence short-circuit: repeated runs over an unchanged tree
    // converge to a no-op through this flag.
    let meta = match store.get(reference) {
        Ok(meta) => meta,
        Err(StoreError::NotFound(_)) => {
            // Analysis never produced an entry (e.g. unreadable image).
            log::debug!("no signature entry, skipping {}", reference.display());
            return;
        }
        Err(err) => {
            log::warn!("metadata lookup failed for {}: {}", reference.display(), err);
            return;
        }
    };
    if meta.already_deduplicated {
        log::trace!("already deduplicated: {}", reference.display());
        return;
    }

    // Stale index entry, not a duplicate decision.
    let reference_meta = match std::fs::metadata(reference) {
        Ok(m) => m,
        Err(_) => {
            log::debug!("reference vanished, dropping entry {}", reference.display());
            if let Err(err) = store.remove(reference) {
                log::warn!("failed to drop stale entry {}: {}", reference.display(), err);
            }
            return;
        }
    };
    let reference_size = reference_meta.len();
    let reference_modified = match reference_meta.modified() {
        Ok(t) => t,
        Err(err) => {
            log::warn!("no modification time for {}: {}", reference.display(), err);
            return;
        }
    };

    let mut candidates = match store.search_similar(reference) {
        Ok(c) => c,
        Err(err) => {
            log::warn!("similarity search failed for {}: {}", reference.display(), err);
            return;
        }
    };

    // Ascending stored size; ties broken by path so iteration order is
    // deterministic across runs.
    candidates.sort_by(|a, b| {
        a.metadata
            .file_size
            .cmp(&b.metadata.file_size)
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut duplicates = BTreeSet::new();
    for candidate in candidates {
        if candidate.path.as_path() == reference {
            continue;
        }

        // Candidate vanished since it was indexed: heal the index and move on.
        if !candidate.path.exists() {
            log::debug!("candidate vanished, dropping entry {}", candidate.path.display());
            if let Err(err) = store.remove(&candidate.path) {
                log::warn!(
                    "failed to drop stale entry {}: {}",
                    candidate.path.display(),
                    err
                );
            }
            continue;
        }

        duplicates.insert(candidate.path.clone());

        if !loses_to_reference(reference_size, reference_modified, reference, &candidate) {
            continue;
        }

        if dry_run {
            log::info!("DRY RUN: would remove {}", candidate.path.display());
        } else {
            match std::fs::remove_file(&candidate.path) {
                Ok(()) => log::info!("removed duplicate {}", candidate.path.display()),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    log::debug!("candidate already gone: {}", candidate.path.display());
                }
                Err(err) => {
                    log::warn!("failed to remove {}: {}", candidate.path.display(), err);
                    continue;
                }
            }
            // A removed file must leave no orphan entry behind.
            if let Err(err) = store.remove(&candidate.path) {
                log::warn!(
                    "failed to remove entry for {}: {}",
                    candidate.path.display(),
                    err
                );
            }
        }
        result.add_removed_file(&candidate.path, candidate.metadata.file_size);
    }

    result.set_file_duplicates(reference, duplicates);

    // Flag only after every deletion for this reference has been applied; a
    // crash before this point just redoes idempotent deletions on retry.
    if !dry_run {
        if let Err(err) = store.update(reference, MetadataPatch::deduplicated(true)) {
            log::warn!("failed to flag {}: {}", reference.display(), err);
        }
    }
}

/// Survivor rule: does `candidate` get deleted in favor of the reference?
///
/// Deleted iff the candidate is no larger and no older than the reference.
/// On a full tie (equal size, equal mtime) the lexicographically smaller path
/// survives, so exactly one direction of the pair deletes.
fn loses_to_reference(
    reference_size: u64,
    reference_modified: SystemTime,
    reference: &Path,
    candidate: &SimilarCandidate,
) -> bool {
    if candidate.metadata.file_size > reference_size {
        return false;
    }
    if candidate.metadata.modified < reference_modified {
        return false;
    }
    if candidate.metadata.file_size == reference_size
        && candidate.metadata.modified == reference_modified
    {
        return candidate.path.as_path() > reference;
    }
    true
}
