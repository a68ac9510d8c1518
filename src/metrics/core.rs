//! Timing helpers for task metrics

use std::time::{Duration, Instant};

use crate::metrics::job::{JobMetrics, TaskKind};

/// A timing guard that records the task duration when dropped
///
/// RAII-style, so a task that bails out early with `?` is still timed.
pub struct TaskTimer {
    start: Instant,
    kind: TaskKind,
}

impl TaskTimer {
    pub fn start(kind: TaskKind) -> Self {
        Self {
            start: Instant::now(),
            kind,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Finish the timing explicitly, returning the elapsed time
    pub fn finish(self) -> Duration {
        self.elapsed()
        // Drop records the histogram
    }
}

impl Drop for TaskTimer {
    fn drop(&mut self) {
        JobMetrics::record_task_finished(self.kind, self.start.elapsed().as_secs_f64());
    }
}
