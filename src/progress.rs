//! For tracking conversion progress and aborting early

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A trait that is used to report progress to some consumer.
pub trait ProgressReporter: Send {
    /// Called after each frame has been written.
    ///
    /// This method may return `false` to abort processing.
    fn increase(&mut self) -> bool;

    /// Fraction of frames written so far, 0 to 1. Advisory only.
    fn progress(&mut self, _fraction: f32) {}

    /// File size so far
    fn written_bytes(&mut self, _current_file_size_in_bytes: u64) {}

    /// Writing is done when `Writer::write()` call returns
    fn done(&mut self, _msg: &str) {}
}

/// No-op progress reporter
pub struct NoProgress {}

impl ProgressReporter for NoProgress {
    fn increase(&mut self) -> bool {
        true
    }
}

/// Wraps a closure that receives the fraction done
pub struct ProgressFn<F>(pub F);

impl<F: FnMut(f32) + Send> ProgressReporter for ProgressFn<F> {
    fn increase(&mut self) -> bool {
        true
    }

    fn progress(&mut self, fraction: f32) {
        (self.0)(fraction);
    }
}

/// Cooperative cancellation of a render.
///
/// Checked between frames, so a render stops after at most one more frame.
#[derive(Clone, Default, Debug)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Implement the progress reporter trait for a progress bar,
/// to make it usable for frame processing reporting.
#[cfg(feature = "pbr")]
impl<T> ProgressReporter for pbr::ProgressBar<T> where T: std::io::Write + Send {
    fn increase(&mut self) -> bool {
        self.inc();
        true
    }

    fn done(&mut self, msg: &str) {
        self.finish_print(msg);
    }
}
