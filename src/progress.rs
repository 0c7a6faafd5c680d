//! Progress reporting for frame export.
//!
//! [`save_frames`](crate::save_frames) reports each written frame through a
//! [`ProgressCallback`]. Callbacks observe; they cannot stop the export.
//!
//! # Example
//!
//! ```no_run
//! use labvideo::{ExportOptions, FrameSource, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% ({} frames)", info.current);
//!         }
//!     }
//! }
//!
//! let mut source = FrameSource::open("SampleVideo.mp4")?;
//! let options = ExportOptions::new().with_progress(Box::new(PrintProgress));
//! labvideo::save_frames(&mut source, "out/frame", &options)?;
//! # Ok::<(), labvideo::LabVideoError>(())
//! ```

use std::time::{Duration, Instant};

/// A snapshot of export progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames written so far.
    pub current: u64,
    /// Frames expected in total, if known.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time since the export started.
    pub elapsed: Duration,
    /// Estimated time remaining, from the throughput so far.
    pub estimated_remaining: Option<Duration>,
    /// Physical index of the frame just written.
    pub current_frame: Option<u64>,
}

/// Receives progress updates during an export.
pub trait ProgressCallback {
    /// Called after every `batch_size` frames and once at the end.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Counts finished items and fires the callback in batches.
pub(crate) struct ProgressTracker<'a> {
    callback: &'a dyn ProgressCallback,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(
        callback: &'a dyn ProgressCallback,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
        }
    }

    pub(crate) fn advance(&mut self, frame_number: u64) {
        self.current += 1;
        if self.current % self.batch_size == 0 {
            self.report(Some(frame_number));
        }
    }

    pub(crate) fn finish(&self) {
        self.report(None);
    }

    fn report(&self, current_frame: Option<u64>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32) * 100.0);

        let estimated_remaining = match (self.total, self.current) {
            (Some(total), current) if current > 0 => {
                let per_item = elapsed.as_secs_f64() / current as f64;
                Some(Duration::from_secs_f64(
                    per_item * total.saturating_sub(current) as f64,
                ))
            }
            _ => None,
        };

        self.callback.on_progress(&ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(u64, Option<u64>)>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.seen.borrow_mut().push((info.current, info.current_frame));
        }
    }

    #[test]
    fn reports_every_batch_and_at_finish() {
        let recorder = Recorder::default();
        let mut tracker = ProgressTracker::new(&recorder, Some(5), 2);
        for frame in [10, 11, 12, 13, 14] {
            tracker.advance(frame);
        }
        tracker.finish();

        assert_eq!(
            *recorder.seen.borrow(),
            vec![(2, Some(11)), (4, Some(13)), (5, None)]
        );
    }
}
