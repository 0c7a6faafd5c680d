//! Frame ranges.
//!
//! A [`FrameRange`] is the `(start, stop, step)` view a caller requests over a
//! source. Once the source has been probed it is normalised into a
//! [`ResolvedRange`], whose `stop` is always concrete.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::iter::StepBy;
use std::ops::Range;
use std::path::Path;

use crate::error::LabVideoError;

/// A requested `(start, stop, step)` view over a source's frames.
///
/// `stop` is exclusive. `None` means "to the end of the source".
///
/// # Example
///
/// ```
/// use labvideo::FrameRange;
///
/// // Every second frame from 1 up to (but not including) 10.
/// let range = FrameRange::new(1, Some(10), 2);
/// assert_eq!(range.step, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    /// First frame to produce.
    pub start: u64,
    /// Exclusive upper bound; `None` means the probed frame count.
    pub stop: Option<u64>,
    /// Stride between produced frames. Must be at least 1.
    pub step: u64,
}

impl Default for FrameRange {
    fn default() -> Self {
        Self {
            start: 0,
            stop: None,
            step: 1,
        }
    }
}

impl FrameRange {
    /// Create a range from its three components.
    pub fn new(start: u64, stop: Option<u64>, step: u64) -> Self {
        Self { start, stop, step }
    }

    /// The whole source, one frame at a time.
    pub fn all() -> Self {
        Self::default()
    }

    /// Substitute the frame count for an open `stop` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`LabVideoError::InvalidRange`] unless
    /// `start < stop <= frame_count` and `step >= 1`, or if `step` does not
    /// fit in a `usize` on this target.
    pub fn resolve(self, frame_count: u64, path: &Path) -> Result<ResolvedRange, LabVideoError> {
        let stop = self.stop.unwrap_or(frame_count);

        let step_fits = usize::try_from(self.step).is_ok();
        if self.step == 0 || !step_fits || self.start >= stop || stop > frame_count {
            return Err(LabVideoError::InvalidRange {
                start: self.start,
                stop: self.stop,
                step: self.step,
                frame_count,
                path: path.to_path_buf(),
            });
        }

        Ok(ResolvedRange {
            start: self.start,
            stop,
            step: self.step,
        })
    }
}

/// A validated range: `start < stop <= frame_count`, `step >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    /// First frame produced.
    pub start: u64,
    /// Exclusive upper bound.
    pub stop: u64,
    /// Stride between produced frames.
    pub step: u64,
}

impl ResolvedRange {
    /// Returns `true` if `index` is one of `start, start + step, ...` below `stop`.
    pub fn contains(&self, index: u64) -> bool {
        index >= self.start && index < self.stop && (index - self.start) % self.step == 0
    }

    /// Number of frames a full sequential pass produces.
    pub fn len(&self) -> u64 {
        (self.stop - self.start).div_ceil(self.step)
    }

    /// Always `false`; a resolved range holds at least one frame.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The physical indices a sequential pass visits, in order.
    pub fn indices(&self) -> StepBy<Range<u64>> {
        // Any stride at least as long as the range visits only `start`.
        let step = usize::try_from(self.step).unwrap_or(usize::MAX);
        (self.start..self.stop).step_by(step)
    }
}

impl Display for ResolvedRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "({}, {}, {})", self.start, self.stop, self.step)
    }
}
