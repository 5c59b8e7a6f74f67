use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Default)]
struct TaskState {
    file_name: OnceLock<String>,
    started: AtomicBool,
    cancelled: AtomicBool,
    total: AtomicUsize,
    converted: AtomicUsize,
}

/// Progress and cancellation handle of one import.
///
/// Clones share state, so a scheduler thread can poll progress and cancel
/// while the builder runs elsewhere.
#[derive(Debug, Clone, Default)]
pub struct ImportTask {
    state: Arc<TaskState>,
}

impl ImportTask {
    /// Create a fresh, uncancelled task.
    pub fn new() -> Self {
        Self::default()
    }

    /// Human-readable status line.
    pub fn description(&self) -> String {
        let file = self
            .state
            .file_name
            .get()
            .map(String::as_str)
            .unwrap_or("<unnamed>");
        if self.state.started.load(Ordering::Acquire) {
            format!(
                "Importing {file}, total / parsed is {} / {}",
                self.total(),
                self.converted()
            )
        } else {
            format!("Importing raw data file: {file}")
        }
    }

    /// Fraction of work units converted, in `[0, 1]`.
    pub fn finished_percentage(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (self.converted() as f64 / total as f64).min(1.0)
        }
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    /// Total work units (frames, or scans for flat files).
    pub fn total(&self) -> usize {
        self.state.total.load(Ordering::Acquire)
    }

    /// Work units converted so far.
    pub fn converted(&self) -> usize {
        self.state.converted.load(Ordering::Acquire)
    }

    pub(crate) fn set_file_name(&self, name: &str) {
        // first name wins
        let _ = self.state.file_name.set(name.to_string());
    }

    pub(crate) fn begin(&self, total: usize) {
        self.state.total.store(total, Ordering::Release);
        self.state.converted.store(0, Ordering::Release);
        self.state.started.store(true, Ordering::Release);
    }

    pub(crate) fn advance(&self) -> usize {
        self.state.converted.fetch_add(1, Ordering::AcqRel) + 1
    }
}
