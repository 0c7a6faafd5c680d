//! Source metadata types.
//!
//! [`VideoProperties`] is discovered once, when a
//! [`FrameSource`](crate::FrameSource) is opened, and stays fixed for the
//! lifetime of the source.

use std::fmt::{Display, Formatter, Result as FmtResult};

use image::DynamicImage;

/// Shape of a frame in `(height, width, channels)` order.
///
/// `channels` is `None` for single-channel (grayscale) frames, which have no
/// channel axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameShape {
    /// Rows of pixels.
    pub height: u32,
    /// Columns of pixels.
    pub width: u32,
    /// Channel count, or `None` for a 2-D grayscale frame.
    pub channels: Option<u8>,
}

impl FrameShape {
    /// Build a shape from a pixel size and a channel count. A count of 1
    /// collapses the channel axis.
    pub fn new(height: u32, width: u32, channels: u8) -> Self {
        Self {
            height,
            width,
            channels: (channels > 1).then_some(channels),
        }
    }

    /// The shape of an image as it would be reported for a decoded frame.
    pub fn of(image: &DynamicImage) -> Self {
        Self::new(image.height(), image.width(), image.color().channel_count())
    }

    /// Number of axes: 2 for grayscale, 3 otherwise.
    pub fn ndim(&self) -> usize {
        if self.channels.is_some() { 3 } else { 2 }
    }

    /// Number of colour channels, counting grayscale as one.
    pub fn channel_count(&self) -> u8 {
        self.channels.unwrap_or(1)
    }
}

impl Display for FrameShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.channels {
            Some(channels) => write!(f, "({}, {}, {})", self.height, self.width, channels),
            None => write!(f, "({}, {})", self.height, self.width),
        }
    }
}

/// Metadata for an opened frame source.
///
/// # Example
///
/// ```no_run
/// use labvideo::FrameSource;
///
/// let source = FrameSource::open("SampleVideo.mp4")?;
/// let properties = source.properties();
/// println!(
///     "{} frames of {} at {:.2} fps [{}]",
///     properties.frame_count, properties.frame_size, properties.fps, properties.codec,
/// );
/// # Ok::<(), labvideo::LabVideoError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoProperties {
    /// Number of frames available from the source.
    pub frame_count: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Colour channels of a raw decoded frame (1 or 3).
    pub colour_channels: u8,
    /// Raw frame shape, `(height, width, colour_channels)`.
    pub frame_size: FrameShape,
    /// Frames per second. Image sequences report `0.0`.
    pub fps: f64,
    /// Codec name for containers (e.g. `"h264"`), image format for
    /// sequences (e.g. `"png"`).
    pub codec: String,
    /// Extension of the source file, without the leading dot.
    pub file_extension: String,
}

impl VideoProperties {
    /// Assemble the bundle, deriving `frame_size` from the other fields.
    pub fn new(
        frame_count: u64,
        width: u32,
        height: u32,
        colour_channels: u8,
        fps: f64,
        codec: impl Into<String>,
        file_extension: impl Into<String>,
    ) -> Self {
        Self {
            frame_count,
            width,
            height,
            colour_channels,
            frame_size: FrameShape::new(height, width, colour_channels),
            fps,
            codec: codec.into(),
            file_extension: file_extension.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, RgbImage};

    use super::*;

    #[test]
    fn grayscale_shape_has_no_channel_axis() {
        let gray = DynamicImage::ImageLuma8(GrayImage::new(4, 3));
        let shape = FrameShape::of(&gray);
        assert_eq!(shape.ndim(), 2);
        assert_eq!(shape.to_string(), "(3, 4)");
    }

    #[test]
    fn colour_shape_is_height_width_channels() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::new(1920, 1080));
        let shape = FrameShape::of(&rgb);
        assert_eq!(shape, FrameShape::new(1080, 1920, 3));
        assert_eq!(shape.to_string(), "(1080, 1920, 3)");
    }
}
