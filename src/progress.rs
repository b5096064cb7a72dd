//! Progress reporting for source rescans using indicatif.
//!
//! Rescanning a large source can take a while, so each rescanned source gets
//! its own spinner on stderr. Cache hits never show a spinner. Stdout is left
//! untouched so callers can keep parsing results.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// How often the spinner position is refreshed, in files.
const FILE_TICK_INTERVAL: usize = 64;

/// Progress callback for source scans.
///
/// Implement this trait to receive updates while sources are rescanned.
/// Callbacks may arrive from several threads at once.
pub trait ScanProgress: Send + Sync {
    /// Called when a source rescan starts.
    fn on_scan_start(&self, source: &str);

    /// Called periodically with the number of candidate files found so far.
    fn on_files(&self, source: &str, count: usize);

    /// Called when a source rescan finishes.
    fn on_scan_end(&self, source: &str, entries: usize);
}

/// Should a file count be forwarded to [`ScanProgress::on_files`]?
#[must_use]
pub fn should_report(count: usize) -> bool {
    count % FILE_TICK_INTERVAL == 0
}

/// Spinner-based progress reporter.
pub struct Progress {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no spinners will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use romsearch::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::stderr())
        };
        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {prefix} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }
}

impl ScanProgress for Progress {
    fn on_scan_start(&self, source: &str) {
        if self.quiet {
            return;
        }

        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix(format!("Indexing {source}"));
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(source.to_string(), pb);
        }
    }

    fn on_files(&self, source: &str, count: usize) {
        if let Ok(bars) = self.bars.lock() {
            if let Some(pb) = bars.get(source) {
                pb.set_position(count as u64);
            }
        }
    }

    fn on_scan_end(&self, source: &str, entries: usize) {
        let pb = self.bars.lock().ok().and_then(|mut bars| bars.remove(source));
        if let Some(pb) = pb {
            pb.set_position(entries as u64);
            pb.finish_and_clear();
        }
    }
}
