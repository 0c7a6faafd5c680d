//! Source configuration.
//!
//! [`SourceOptions`] is a builder that carries the optional settings of a
//! [`FrameSource`](crate::FrameSource): grayscale output, the requested frame
//! range, and a post-read return function.
//!
//! # Example
//!
//! ```no_run
//! use labvideo::{FrameRange, FrameSource, SourceOptions};
//!
//! let options = SourceOptions::new()
//!     .with_grayscale(true)
//!     .with_frame_range(FrameRange::new(5, Some(20), 4))
//!     .with_return_function(|frame| frame.fliph());
//!
//! let mut source = FrameSource::open_with_options("SampleVideo.mp4", options)?;
//! for frame in source.frames() {
//!     let frame = frame?;
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! # Ok::<(), labvideo::LabVideoError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};

use image::DynamicImage;

use crate::range::FrameRange;

/// A transform applied to every frame after grayscale conversion.
pub type ReturnFunction = Box<dyn FnMut(DynamicImage) -> DynamicImage>;

/// Optional settings for opening a [`FrameSource`](crate::FrameSource).
///
/// A default-constructed value reads every frame in colour with no
/// transform.
#[derive(Default)]
pub struct SourceOptions {
    pub(crate) grayscale: bool,
    pub(crate) frame_range: FrameRange,
    pub(crate) return_function: Option<ReturnFunction>,
}

impl Debug for SourceOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SourceOptions")
            .field("grayscale", &self.grayscale)
            .field("frame_range", &self.frame_range)
            .field("has_return_function", &self.return_function.is_some())
            .finish()
    }
}

impl SourceOptions {
    /// Options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert every returned frame to 8-bit grayscale.
    #[must_use]
    pub fn with_grayscale(mut self, grayscale: bool) -> Self {
        self.grayscale = grayscale;
        self
    }

    /// Restrict sequential reads to `range`.
    #[must_use]
    pub fn with_frame_range(mut self, range: FrameRange) -> Self {
        self.frame_range = range;
        self
    }

    /// Apply `function` to every returned frame, after grayscale conversion.
    #[must_use]
    pub fn with_return_function<F>(mut self, function: F) -> Self
    where
        F: FnMut(DynamicImage) -> DynamicImage + 'static,
    {
        self.return_function = Some(Box::new(function));
        self
    }

    /// The requested frame range.
    pub fn frame_range(&self) -> FrameRange {
        self.frame_range
    }

    /// Whether grayscale conversion is enabled.
    pub fn is_grayscale(&self) -> bool {
        self.grayscale
    }
}
