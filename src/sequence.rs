//! Still-image backend.
//!
//! An image sequence is an ordered list of files, one frame each. Any frame
//! can be decoded directly, so seeking only moves the position. A single
//! still image is a sequence of length one.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};

use crate::backend::FrameBackend;
use crate::error::LabVideoError;
use crate::metadata::{FrameShape, VideoProperties};

/// Frames read from an ordered list of still images.
#[derive(Debug)]
pub struct SequenceBackend {
    /// Locator the sequence was opened from, for error context.
    locator: PathBuf,
    /// Empty once closed.
    paths: Vec<PathBuf>,
    properties: VideoProperties,
    position: u64,
}

impl SequenceBackend {
    /// Open an ordered list of image files, probing the first for its shape.
    ///
    /// # Errors
    ///
    /// Returns [`LabVideoError::FileOpen`] if `paths` is empty or the first
    /// image cannot be decoded.
    pub fn open(locator: &Path, paths: Vec<PathBuf>) -> Result<Self, LabVideoError> {
        let open_error = |reason: String| LabVideoError::FileOpen {
            path: locator.to_path_buf(),
            reason,
        };

        let first = paths
            .first()
            .ok_or_else(|| open_error("no image files to read".to_string()))?;
        let first_frame = image::open(first)
            .map_err(|error| open_error(format!("cannot decode {}: {error}", first.display())))?;
        let shape = FrameShape::of(&first_frame);

        let codec = ImageFormat::from_path(first)
            .ok()
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("unknown");
        let file_extension = first
            .extension()
            .map(|extension| extension.to_string_lossy().into_owned())
            .unwrap_or_default();

        let properties = VideoProperties::new(
            paths.len() as u64,
            shape.width,
            shape.height,
            shape.channel_count(),
            0.0,
            codec,
            file_extension,
        );

        log::debug!(
            "Opened {} image(s) from {}: frame size {}",
            paths.len(),
            locator.display(),
            properties.frame_size,
        );

        Ok(Self {
            locator: locator.to_path_buf(),
            paths,
            properties,
            position: 0,
        })
    }

    /// Open exactly one still image.
    pub fn single(path: &Path) -> Result<Self, LabVideoError> {
        Self::open(path, vec![path.to_path_buf()])
    }
}

impl FrameBackend for SequenceBackend {
    fn properties(&self) -> &VideoProperties {
        &self.properties
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, index: u64) -> Result<(), LabVideoError> {
        self.position = index;
        Ok(())
    }

    fn decode_next(&mut self) -> Result<DynamicImage, LabVideoError> {
        let index = self.position;
        self.position = index.saturating_add(1);

        let Some(path) = usize::try_from(index)
            .ok()
            .and_then(|slot| self.paths.get(slot))
        else {
            return Err(if self.paths.is_empty() {
                LabVideoError::SourceClosed {
                    path: self.locator.clone(),
                }
            } else {
                LabVideoError::FrameReadError {
                    index,
                    path: self.locator.clone(),
                    reason: "past the last image of the sequence".to_string(),
                }
            });
        };

        log::trace!("Decoding frame {index} from {}", path.display());
        image::open(path).map_err(|error| LabVideoError::FrameReadError {
            index,
            path: path.clone(),
            reason: error.to_string(),
        })
    }

    fn is_random_access(&self) -> bool {
        true
    }

    fn close(&mut self) {
        self.paths.clear();
    }
}
