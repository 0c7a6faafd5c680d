//! Writing frames to numbered image files.
//!
//! [`save_frames`] walks a [`FrameSource`]'s range and saves every frame as
//! `<stub><index>.<extension>`, with the physical frame index zero-padded by
//! [`frame_suffix`].
//!
//! # Example
//!
//! ```no_run
//! use labvideo::{ExportOptions, FrameRange, FrameSource, SourceOptions};
//!
//! let options = SourceOptions::new().with_frame_range(FrameRange::new(0, None, 10));
//! let mut source = FrameSource::open_with_options("SampleVideo.mp4", options)?;
//!
//! // frames/SampleVideo00000.png, frames/SampleVideo00010.png, ...
//! let written = labvideo::save_frames(&mut source, "frames/SampleVideo", &ExportOptions::new())?;
//! println!("wrote {} files", written.len());
//! # Ok::<(), labvideo::LabVideoError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::LabVideoError;
use crate::progress::{NoOpProgress, ProgressCallback, ProgressTracker};
use crate::source::FrameSource;

/// Zero-pad a frame index to `digits` characters.
///
/// Indices wider than `digits` are written in full.
///
/// ```
/// assert_eq!(labvideo::frame_suffix(5, 4), "0005");
/// assert_eq!(labvideo::frame_suffix(12345, 3), "12345");
/// ```
pub fn frame_suffix(index: u64, digits: usize) -> String {
    format!("{index:0digits$}")
}

/// Settings for [`save_frames`].
pub struct ExportOptions {
    extension: String,
    digits: usize,
    overwrite: bool,
    batch_size: u64,
    progress: Box<dyn ProgressCallback>,
}

impl Debug for ExportOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExportOptions")
            .field("extension", &self.extension)
            .field("digits", &self.digits)
            .field("overwrite", &self.overwrite)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportOptions {
    /// PNG output, five-digit suffixes, no overwriting, no progress callback.
    pub fn new() -> Self {
        Self {
            extension: "png".to_string(),
            digits: 5,
            overwrite: false,
            batch_size: 1,
            progress: Box::new(NoOpProgress),
        }
    }

    /// Image extension, which also selects the encoder (`png`, `jpg`, `tiff`, ...).
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// Width of the zero-padded frame index.
    #[must_use]
    pub fn with_digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }

    /// Replace files that already exist instead of failing.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Box<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Fire the progress callback every `size` frames. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Output path for a frame index.
    pub fn output_path(&self, stub: &Path, index: u64) -> PathBuf {
        let mut name = stub.as_os_str().to_owned();
        name.push(frame_suffix(index, self.digits));
        name.push(".");
        name.push(&self.extension);
        PathBuf::from(name)
    }
}

/// Save every remaining frame of `source`'s range as a numbered image.
///
/// Frames are read sequentially from the current cursor, so the source's
/// grayscale setting and return function apply. Parent directories of `stub`
/// are created as needed. Returns the written paths in order.
///
/// # Errors
///
/// Stops at the first failure: any read error from the source, an
/// [`ErrorKind::AlreadyExists`] I/O error when a target exists and
/// overwriting is off, or an image encoding error.
pub fn save_frames<P: AsRef<Path>>(
    source: &mut FrameSource,
    stub: P,
    options: &ExportOptions,
) -> Result<Vec<PathBuf>, LabVideoError> {
    let stub = stub.as_ref();
    if let Some(parent) = stub.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let range = source.frame_range();
    let remaining = range.stop.saturating_sub(source.position()).div_ceil(range.step);
    let mut tracker =
        ProgressTracker::new(options.progress.as_ref(), Some(remaining), options.batch_size);

    log::debug!(
        "Saving {remaining} frame(s) from {} to {}*.{}",
        source.path().display(),
        stub.display(),
        options.extension,
    );

    let mut written = Vec::new();
    while source.position() < range.stop {
        let index = source.position();
        let output_path = options.output_path(stub, index);
        if output_path.exists() && !options.overwrite {
            return Err(LabVideoError::IoError(IoError::new(
                ErrorKind::AlreadyExists,
                format!("{} already exists", output_path.display()),
            )));
        }

        let frame = source.read_next_frame()?;
        frame.save(&output_path)?;
        log::trace!("Saved frame {index} to {}", output_path.display());

        tracker.advance(index);
        written.push(output_path);
    }

    tracker.finish();
    Ok(written)
}
