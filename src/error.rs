//! Error types for the `labvideo` crate.
//!
//! This module defines [`LabVideoError`], the unified error type returned by
//! every fallible operation in the crate. Variants carry the attempted index,
//! the declared range, and the source path so a failure can be diagnosed
//! without inspecting a [`FrameSource`](crate::FrameSource)'s internals.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::range::ResolvedRange;

/// The unified error type for all `labvideo` operations.
///
/// Iteration exhaustion is never reported through this type; a
/// [`Frames`](crate::Frames) iterator simply returns `None` once the cursor
/// reaches the end of its range.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LabVideoError {
    /// The locator does not name a recognised container, image sequence, or
    /// still image.
    #[error("Unsupported source format for {path} (extension: {extension:?})")]
    UnsupportedFormat {
        /// Locator passed to [`FrameSource::open`](crate::FrameSource::open).
        path: PathBuf,
        /// File extension found on the locator, if any.
        extension: Option<String>,
    },

    /// The source could not be opened or probed.
    #[error("Failed to open frame source at {path}: {reason}")]
    FileOpen {
        /// Locator that failed to open.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The requested frame range is inconsistent with the probed frame count.
    #[error(
        "Invalid frame range ({start}, {stop:?}, {step}) for {path} with {frame_count} frames"
    )]
    InvalidRange {
        /// Requested first frame.
        start: u64,
        /// Requested stop frame (exclusive); `None` means "to the end".
        stop: Option<u64>,
        /// Requested stride.
        step: u64,
        /// Number of frames discovered at open time.
        frame_count: u64,
        /// Source path.
        path: PathBuf,
    },

    /// An absolute frame index lies outside `[0, frame_count)`.
    #[error("Frame {index} is out of range for {path} (source has {frame_count} frames)")]
    IndexOutOfRange {
        /// The frame index that was requested.
        index: u64,
        /// Number of frames in the source.
        frame_count: u64,
        /// Source path.
        path: PathBuf,
    },

    /// The logical cursor is outside the declared range or off its stride.
    #[error("Frame {cursor} is not in range {range} of {path}")]
    FrameNotInRange {
        /// Logical cursor at the time of the call.
        cursor: u64,
        /// The declared `(start, stop, step)` range.
        range: ResolvedRange,
        /// Source path.
        path: PathBuf,
    },

    /// Decoding a frame that should exist failed.
    #[error("Failed to read frame {index} from {path}: {reason}")]
    FrameReadError {
        /// Physical index that was being read.
        index: u64,
        /// Source path.
        path: PathBuf,
        /// Underlying decoder message.
        reason: String,
    },

    /// The source was used after [`close`](crate::FrameSource::close).
    #[error("Frame source {path} has been closed")]
    SourceClosed {
        /// Source path.
        path: PathBuf,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while decoding or saving a still image.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for LabVideoError {
    fn from(error: FfmpegError) -> Self {
        LabVideoError::FfmpegError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ffmpeg_errors_keep_their_message() {
        let error = LabVideoError::from(FfmpegError::Eof);
        assert!(matches!(error, LabVideoError::FfmpegError(_)));
        assert_eq!(error.to_string(), format!("FFmpeg error: {}", FfmpegError::Eof));
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn open_missing() -> Result<(), LabVideoError> {
            std::fs::File::open("definitely/not/here.png")?;
            Ok(())
        }

        assert!(matches!(open_missing(), Err(LabVideoError::IoError(_))));
    }
}
