//! Progress reporting for the per-root processing pools.
//!
//! The engine talks to the [`ProgressCallback`] trait so it stays agnostic of
//! rendering; [`Progress`] draws indicatif bars, [`NoProgress`] is the silent
//! stand-in used by tests and library callers.

use std::sync::Mutex;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Callback for per-root phase progress.
///
/// Implementations must support concurrent [`on_progress`] calls from
/// worker-pool threads without losing increments.
///
/// [`on_progress`]: ProgressCallback::on_progress
pub trait ProgressCallback: Send + Sync {
    /// A phase ("analyze" or "resolve") starts over `total` files.
    fn on_phase_start(&self, phase: &str, total: u64);

    /// One file has been considered; increments the counter by one.
    fn on_progress(&self, path: &str);

    /// The current phase is complete.
    fn on_phase_end(&self, phase: &str);
}

/// No-op progress sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&self, _phase: &str, _total: u64) {}
    fn on_progress(&self, _path: &str) {}
    fn on_phase_end(&self, _phase: &str) {}
}

/// Terminal progress bars via indicatif.
pub struct Progress {
    multi: MultiProgress,
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a progress reporter. With `quiet` set, nothing is drawn.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: u64) {
        if self.quiet {
            return;
        }

        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(Self::bar_style());
        pb.set_message(phase.to_string());

        let mut bar = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = bar.take() {
            old.finish_and_clear();
        }
        *bar = Some(pb);
    }

    fn on_progress(&self, path: &str) {
        if self.quiet {
            return;
        }

        if let Some(ref pb) = *self.bar.lock().unwrap_or_else(|e| e.into_inner()) {
            pb.inc(1);
            pb.set_message(truncate_path(path, 40));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.bar.lock().unwrap_or_else(|e| e.into_inner()).take() {
            pb.finish_with_message(format!("{phase} complete"));
        }
    }
}

/// Truncate a path for display in the progress bar.
///
/// Lengths are counted in chars, not bytes, so multi-byte file names are
/// never split mid code point.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_chars = file_name.chars().count();
    if name_chars >= max_len {
        let skip = name_chars - (max_len - 3);
        let tail: String = file_name.chars().skip(skip).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_path_short() {
        assert_eq!(truncate_path("a/b.png", 40), "a/b.png");
    }

    #[test]
    fn test_truncate_path_long() {
        let path = format!("{}/photo.png", "d".repeat(100));
        assert_eq!(truncate_path(&path, 40), ".../photo.png");
    }

    #[test]
    fn test_truncate_path_long_name() {
        let path = format!("dir/{}", "n".repeat(60));
        let out = truncate_path(&path, 40);
        assert_eq!(out.chars().count(), 40);
        assert!(out.starts_with("..."));
    }

    #[test]
    fn test_truncate_path_multibyte_name() {
        // 50 Cyrillic chars: twice that many bytes, so any byte-offset
        // truncation would land mid code point.
        let path = format!("dir/{}", "ф".repeat(50));
        let out = truncate_path(&path, 40);
        assert_eq!(out.chars().count(), 40);
        assert!(out.starts_with("..."));
        assert!(out.ends_with('ф'));

        // A short multibyte name fits untouched.
        let short = "ф".repeat(25);
        assert_eq!(truncate_path(&short, 40), short);
    }

    #[test]
    fn test_quiet_progress_is_inert() {
        let progress = Progress::new(true);
        progress.on_phase_start("analyze", 10);
        progress.on_progress("/some/file.png");
        progress.on_phase_end("analyze");
        assert!(progress.bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_no_progress_is_inert() {
        let progress = NoProgress;
        progress.on_phase_start("resolve", 3);
        progress.on_progress("x");
        progress.on_phase_end("resolve");
    }
}
