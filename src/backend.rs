//! The decode capability every kind of frame source provides.
//!
//! [`FrameSource`](crate::FrameSource) owns exactly one boxed
//! [`FrameBackend`], chosen once when the locator is classified. All
//! positional bookkeeping above the backend (range, cursor, cache) lives in
//! the source; the backend only knows how to seek and decode.

use image::DynamicImage;

use crate::error::LabVideoError;
use crate::metadata::VideoProperties;

/// Seek and decode primitives over one physical sequence of frames.
///
/// Implementations are driven from a single thread and are never shared
/// between sources.
pub trait FrameBackend {
    /// Metadata probed when the backend was opened.
    fn properties(&self) -> &VideoProperties;

    /// Physical index the next [`decode_next`](FrameBackend::decode_next)
    /// will produce.
    fn position(&self) -> u64;

    /// Reposition so the next decode yields `index`.
    ///
    /// `index` has already been checked against the frame count.
    fn seek(&mut self, index: u64) -> Result<(), LabVideoError>;

    /// Decode the frame at [`position`](FrameBackend::position) and advance
    /// by one.
    ///
    /// The returned image must own its pixels. Implementations advance past a
    /// frame even when decoding it fails.
    fn decode_next(&mut self) -> Result<DynamicImage, LabVideoError>;

    /// Decode the frame at `index`, seeking first only when needed.
    fn decode_at(&mut self, index: u64) -> Result<DynamicImage, LabVideoError> {
        if self.position() != index {
            self.seek(index)?;
        }
        self.decode_next()
    }

    /// `true` when seeking costs no more than a sequential decode.
    fn is_random_access(&self) -> bool {
        false
    }

    /// Release decoder and file handles. Must tolerate repeated calls.
    fn close(&mut self) {}
}
