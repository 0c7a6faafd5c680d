//! Uniform frame access over containers, image sequences, and single images.
//!
//! [`FrameSource`] is the main entry point for the crate. It classifies a
//! locator, probes it once, and then serves frames by absolute index, by
//! sequential reads over a `(start, stop, step)` range, or through borrowed
//! slices. A one-frame cache makes reading the same index twice in a row free,
//! and the decoder is only asked to seek when a read is neither cached nor at
//! its current position.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::iter::{FusedIterator, StepBy};
use std::ops::{Bound, Range, RangeBounds};
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::backend::FrameBackend;
use crate::container::ContainerBackend;
use crate::error::LabVideoError;
use crate::metadata::{FrameShape, VideoProperties};
use crate::options::{ReturnFunction, SourceOptions};
use crate::pattern::{SourceKind, classify};
use crate::range::ResolvedRange;
use crate::sequence::SequenceBackend;

/// The most recently decoded raw frame and its physical index.
struct CachedFrame {
    index: u64,
    image: DynamicImage,
}

/// A frame-indexable, iterable view over a video, image sequence, or image.
///
/// The source exclusively owns its decoder. It is meant to be driven from one
/// place at a time; independent sources opened on the same file do not share
/// any state.
///
/// Dropping a source closes it, so decoder handles are released on every exit
/// path. [`close`](FrameSource::close) may also be called explicitly, any
/// number of times.
///
/// # Example
///
/// ```no_run
/// use labvideo::{FrameRange, FrameSource, SourceOptions};
///
/// let mut source = FrameSource::open("SampleVideo.mp4")?;
/// let first = source.read_next_frame()?;
/// let tenth = source.read_frame(Some(10))?;
/// assert_eq!(first.dimensions(), tenth.dimensions());
///
/// let options = SourceOptions::new().with_frame_range(FrameRange::new(1, Some(10), 2));
/// let mut strided = FrameSource::open_with_options("SampleVideo.mp4", options)?;
/// for frame in &mut strided {
///     frame?.save("frame.png")?;
/// }
/// # use image::GenericImageView;
/// # Ok::<(), labvideo::LabVideoError>(())
/// ```
pub struct FrameSource {
    path: PathBuf,
    /// How the locator was classified, for display.
    kind: &'static str,
    /// `None` once closed.
    backend: Option<Box<dyn FrameBackend>>,
    properties: VideoProperties,
    range: ResolvedRange,
    /// Next physical index a sequential read produces.
    cursor: u64,
    grayscale: bool,
    return_function: Option<ReturnFunction>,
    cache: Option<CachedFrame>,
}

impl Debug for FrameSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FrameSource")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("properties", &self.properties)
            .field("range", &self.range)
            .field("cursor", &self.cursor)
            .field("grayscale", &self.grayscale)
            .field("cached_index", &self.cache.as_ref().map(|cached| cached.index))
            .field("closed", &self.backend.is_none())
            .finish_non_exhaustive()
    }
}

impl FrameSource {
    /// Open a source with default options: colour frames, the full range.
    ///
    /// # Errors
    ///
    /// See [`open_with_options`](FrameSource::open_with_options).
    pub fn open<P: AsRef<Path>>(locator: P) -> Result<Self, LabVideoError> {
        Self::open_with_options(locator, SourceOptions::default())
    }

    /// Open a video file, an image-sequence pattern, or a single image.
    ///
    /// The locator is classified by extension (containers), by wildcards in
    /// its file name (sequences), or by being an existing still image. The
    /// source is probed exactly once.
    ///
    /// # Errors
    ///
    /// - [`LabVideoError::UnsupportedFormat`] if the locator is not a
    ///   recognised container, pattern, or image.
    /// - [`LabVideoError::FileOpen`] if probing fails.
    /// - [`LabVideoError::InvalidRange`] if the requested range does not fit
    ///   the probed frame count.
    pub fn open_with_options<P: AsRef<Path>>(
        locator: P,
        options: SourceOptions,
    ) -> Result<Self, LabVideoError> {
        let path = locator.as_ref();
        let kind = classify(path)?;
        let label = kind.label();
        log::debug!("Opening {} as {label}", path.display());

        let backend: Box<dyn FrameBackend> = match kind {
            SourceKind::Container(file) => Box::new(ContainerBackend::open(&file)?),
            SourceKind::Sequence(files) => Box::new(SequenceBackend::open(path, files)?),
            SourceKind::SingleImage(file) => Box::new(SequenceBackend::single(&file)?),
        };

        let mut source = Self::from_backend(path, backend, options)?;
        source.kind = label;
        Ok(source)
    }

    /// Build a source over an already opened backend.
    ///
    /// `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`LabVideoError::InvalidRange`] if the requested range does not
    /// fit the backend's frame count, or the backend's error if the initial
    /// seek to a non-zero range start fails.
    pub fn from_backend<P: AsRef<Path>>(
        path: P,
        backend: Box<dyn FrameBackend>,
        options: SourceOptions,
    ) -> Result<Self, LabVideoError> {
        let path = path.as_ref().to_path_buf();
        let properties = backend.properties().clone();
        let range = options
            .frame_range
            .resolve(properties.frame_count, &path)?;

        let mut source = Self {
            path,
            kind: "custom backend",
            backend: Some(backend),
            properties,
            range,
            cursor: range.start,
            grayscale: options.grayscale,
            return_function: options.return_function,
            cache: None,
        };

        if range.start != 0 {
            source.set_frame(range.start)?;
        }

        Ok(source)
    }

    /// Read the frame at the logical cursor, then advance the cursor by the
    /// range's step.
    ///
    /// The cursor advances even when decoding fails, so a corrupt frame does
    /// not stall sequential reading.
    ///
    /// # Errors
    ///
    /// - [`LabVideoError::FrameNotInRange`] if the cursor is outside the range
    ///   or off its stride (e.g. after [`set_frame`](FrameSource::set_frame)
    ///   to an unaligned index, or once the range is exhausted).
    /// - [`LabVideoError::FrameReadError`] if decoding fails.
    /// - [`LabVideoError::SourceClosed`] after [`close`](FrameSource::close).
    pub fn read_next_frame(&mut self) -> Result<DynamicImage, LabVideoError> {
        if self.backend.is_none() {
            return Err(self.closed());
        }

        let index = self.cursor;
        if !self.range.contains(index) {
            return Err(LabVideoError::FrameNotInRange {
                cursor: index,
                range: self.range,
                path: self.path.clone(),
            });
        }

        self.cursor = index.saturating_add(self.range.step);
        self.fetch(index)
    }

    /// Read a frame by absolute physical index, or the next sequential frame
    /// when `index` is `None`.
    ///
    /// Reading by index ignores the range and leaves the logical cursor where
    /// it was.
    ///
    /// # Errors
    ///
    /// - [`LabVideoError::IndexOutOfRange`] if `index >= len()`.
    /// - Otherwise as [`read_next_frame`](FrameSource::read_next_frame).
    pub fn read_frame(&mut self, index: Option<u64>) -> Result<DynamicImage, LabVideoError> {
        match index {
            None => self.read_next_frame(),
            Some(index) => {
                self.check_index(index)?;
                self.fetch(index)
            }
        }
    }

    /// Read a frame by absolute physical index.
    ///
    /// Shorthand for `read_frame(Some(index))`.
    pub fn get(&mut self, index: u64) -> Result<DynamicImage, LabVideoError> {
        self.read_frame(Some(index))
    }

    /// Move the logical cursor to `index` and position the decoder there.
    ///
    /// No seek happens when `index` is cached or the decoder is already at
    /// it. If `index` is not on the range's stride, the next sequential read
    /// fails with [`LabVideoError::FrameNotInRange`].
    ///
    /// # Errors
    ///
    /// - [`LabVideoError::IndexOutOfRange`] if `index >= len()`.
    /// - [`LabVideoError::SourceClosed`] after [`close`](FrameSource::close).
    /// - The decoder's error if the seek fails.
    pub fn set_frame(&mut self, index: u64) -> Result<(), LabVideoError> {
        self.check_index(index)?;

        let Some(backend) = self.backend.as_mut() else {
            return Err(self.closed());
        };

        self.cursor = index;
        let cached = self.cache.as_ref().is_some_and(|cached| cached.index == index);
        if cached || backend.position() == index {
            return Ok(());
        }

        backend.seek(index)
    }

    /// Iterate sequentially over the range from the current cursor.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames {
            source: self,
            done: false,
        }
    }

    /// A borrowed view over the physical frames in `range`, every `step`th.
    ///
    /// Bounds are clamped to the source's frame count. The view reads by
    /// absolute index and does not move the logical cursor.
    ///
    /// # Errors
    ///
    /// Returns [`LabVideoError::InvalidRange`] if `step` is zero or does not
    /// fit in a `usize` on this target.
    pub fn slice<R: RangeBounds<u64>>(
        &mut self,
        range: R,
        step: u64,
    ) -> Result<FrameSlice<'_>, LabVideoError> {
        let frame_count = self.len();
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let stop = match range.end_bound() {
            Bound::Included(&end) => end.saturating_add(1),
            Bound::Excluded(&end) => end,
            Bound::Unbounded => frame_count,
        };

        let Some(stride) = usize::try_from(step).ok().filter(|&stride| stride > 0) else {
            return Err(LabVideoError::InvalidRange {
                start,
                stop: Some(stop),
                step,
                frame_count,
                path: self.path.clone(),
            });
        };

        let stop = stop.min(frame_count);
        let start = start.min(stop);
        Ok(FrameSlice {
            source: self,
            indices: (start..stop).step_by(stride),
        })
    }

    /// Physical frame count, regardless of the range in effect.
    pub fn len(&self) -> u64 {
        self.properties.frame_count
    }

    /// Returns `true` if the source has no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Metadata probed when the source was opened.
    pub fn properties(&self) -> &VideoProperties {
        &self.properties
    }

    /// The validated `(start, stop, step)` range.
    pub fn frame_range(&self) -> ResolvedRange {
        self.range
    }

    /// Index the next sequential read will produce.
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Index the decoder will produce next without seeking, or `None` once
    /// closed.
    pub fn decoder_position(&self) -> Option<u64> {
        self.backend.as_ref().map(|backend| backend.position())
    }

    /// `true` when reading out of order costs no more than reading in order,
    /// as for image sequences.
    pub fn is_random_access(&self) -> bool {
        self.backend
            .as_ref()
            .is_some_and(|backend| backend.is_random_access())
    }

    /// How the source is read: `"container"`, `"image sequence"`,
    /// `"single image"`, or `"custom backend"` for
    /// [`from_backend`](FrameSource::from_backend).
    pub fn kind_label(&self) -> &'static str {
        self.kind
    }

    /// Locator the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether frames are converted to grayscale before being returned.
    pub fn is_grayscale(&self) -> bool {
        self.grayscale
    }

    /// Returns `true` once [`close`](FrameSource::close) has run.
    pub fn is_closed(&self) -> bool {
        self.backend.is_none()
    }

    /// Release the decoder and file handles. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.close();
            log::debug!("Closed frame source {}", self.path.display());
        }
        self.cache = None;
    }

    fn fetch(&mut self, index: u64) -> Result<DynamicImage, LabVideoError> {
        let cached = self
            .cache
            .as_ref()
            .filter(|cached| cached.index == index)
            .map(|cached| cached.image.clone());

        let raw = match cached {
            Some(image) => {
                log::trace!("Frame {index} served from cache");
                image
            }
            None => {
                let Some(backend) = self.backend.as_mut() else {
                    return Err(self.closed());
                };
                let image = backend.decode_at(index)?;
                self.check_shape(index, &image)?;
                self.cache = Some(CachedFrame {
                    index,
                    image: image.clone(),
                });
                image
            }
        };

        Ok(self.finish(raw))
    }

    /// Grayscale conversion, then the return function.
    fn finish(&mut self, raw: DynamicImage) -> DynamicImage {
        let frame = if self.grayscale {
            DynamicImage::ImageLuma8(raw.to_luma8())
        } else {
            raw
        };

        match self.return_function.as_mut() {
            Some(function) => function(frame),
            None => frame,
        }
    }

    fn check_index(&self, index: u64) -> Result<(), LabVideoError> {
        if index >= self.len() {
            return Err(LabVideoError::IndexOutOfRange {
                index,
                frame_count: self.len(),
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    fn check_shape(&self, index: u64, image: &DynamicImage) -> Result<(), LabVideoError> {
        let shape = FrameShape::of(image);
        if shape != self.properties.frame_size {
            return Err(LabVideoError::FrameReadError {
                index,
                path: self.path.clone(),
                reason: format!(
                    "frame shape {shape} differs from source shape {}",
                    self.properties.frame_size
                ),
            });
        }
        Ok(())
    }

    fn closed(&self) -> LabVideoError {
        LabVideoError::SourceClosed {
            path: self.path.clone(),
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.close();
    }
}

impl<'a> IntoIterator for &'a mut FrameSource {
    type Item = Result<DynamicImage, LabVideoError>;
    type IntoIter = Frames<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames()
    }
}

/// Sequential iterator over a [`FrameSource`]'s range.
///
/// Yields [`read_next_frame`](FrameSource::read_next_frame) results until the
/// cursor reaches the end of the range. Exhaustion ends the iteration; it is
/// never reported as an error. A decode failure is yielded and iteration
/// continues with the next frame; a cursor that has left the stride, or a
/// closed source, is yielded once and ends the iteration.
pub struct Frames<'a> {
    source: &'a mut FrameSource,
    done: bool,
}

impl Iterator for Frames<'_> {
    type Item = Result<DynamicImage, LabVideoError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.source.cursor >= self.source.range.stop {
            return None;
        }

        let result = self.source.read_next_frame();
        if matches!(
            result,
            Err(LabVideoError::FrameNotInRange { .. } | LabVideoError::SourceClosed { .. })
        ) {
            self.done = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let range = self.source.range;
        let remaining = range.stop.saturating_sub(self.source.cursor).div_ceil(range.step);
        (0, usize::try_from(remaining).ok())
    }
}

impl FusedIterator for Frames<'_> {}

/// A borrowed, strided view over a sub-range of a [`FrameSource`].
///
/// Created by [`FrameSource::slice`]. Reads by absolute index, so consecutive
/// indices decode without seeking.
pub struct FrameSlice<'a> {
    source: &'a mut FrameSource,
    indices: StepBy<Range<u64>>,
}

impl Iterator for FrameSlice<'_> {
    type Item = Result<DynamicImage, LabVideoError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.indices.next()?;
        Some(self.source.read_frame(Some(index)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use image::{GenericImageView, Rgb, RgbImage};

    use super::*;
    use crate::range::FrameRange;

    #[derive(Default)]
    struct Counters {
        seeks: Cell<usize>,
        decodes: Cell<usize>,
        closes: Cell<usize>,
    }

    /// In-memory backend whose frames are filled with their own index.
    struct CountingBackend {
        properties: VideoProperties,
        position: u64,
        counters: Rc<Counters>,
        corrupt: Option<u64>,
        oversized: Option<u64>,
    }

    impl CountingBackend {
        fn new(frame_count: u64, counters: &Rc<Counters>) -> Self {
            Self {
                properties: VideoProperties::new(frame_count, 4, 3, 3, 25.0, "mock", "mp4"),
                position: 0,
                counters: Rc::clone(counters),
                corrupt: None,
                oversized: None,
            }
        }
    }

    impl FrameBackend for CountingBackend {
        fn properties(&self) -> &VideoProperties {
            &self.properties
        }

        fn position(&self) -> u64 {
            self.position
        }

        fn seek(&mut self, index: u64) -> Result<(), LabVideoError> {
            self.counters.seeks.set(self.counters.seeks.get() + 1);
            self.position = index;
            Ok(())
        }

        fn decode_next(&mut self) -> Result<DynamicImage, LabVideoError> {
            let index = self.position;
            self.position += 1;
            self.counters.decodes.set(self.counters.decodes.get() + 1);

            if self.corrupt == Some(index) {
                return Err(LabVideoError::FrameReadError {
                    index,
                    path: PathBuf::from("mock.mp4"),
                    reason: "corrupt packet".to_string(),
                });
            }
            let (width, height) = if self.oversized == Some(index) { (8, 6) } else { (4, 3) };
            let value = index as u8;
            Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
                width,
                height,
                Rgb([value, value.wrapping_add(1), value.wrapping_add(2)]),
            )))
        }

        fn close(&mut self) {
            self.counters.closes.set(self.counters.closes.get() + 1);
        }
    }

    fn open_mock(frame_count: u64, options: SourceOptions) -> (FrameSource, Rc<Counters>) {
        let counters = Rc::new(Counters::default());
        let backend = CountingBackend::new(frame_count, &counters);
        let source = FrameSource::from_backend("mock.mp4", Box::new(backend), options)
            .expect("Failed to open mock source");
        (source, counters)
    }

    fn frame_index(frame: &DynamicImage) -> u8 {
        frame.get_pixel(0, 0).0[0]
    }

    #[test]
    fn strided_iteration_yields_expected_frames() {
        let options = SourceOptions::new().with_frame_range(FrameRange::new(1, Some(10), 2));
        let (mut source, _) = open_mock(20, options);

        let indices: Vec<u8> = source
            .frames()
            .map(|frame| frame_index(&frame.expect("Decode error")))
            .collect();

        assert_eq!(indices, vec![1, 3, 5, 7, 9]);
        assert!(source.frames().next().is_none(), "Range should be exhausted");
    }

    #[test]
    fn sequential_reads_never_seek() {
        let (mut source, counters) = open_mock(20, SourceOptions::new());

        for expected in 0..20 {
            let frame = source.read_next_frame().expect("Decode error");
            assert_eq!(frame_index(&frame), expected);
        }

        assert_eq!(counters.seeks.get(), 0);
        assert_eq!(counters.decodes.get(), 20);
    }

    #[test]
    fn non_zero_start_seeks_once_at_open() {
        let options = SourceOptions::new().with_frame_range(FrameRange::new(5, None, 1));
        let (mut source, counters) = open_mock(20, options);
        assert_eq!(counters.seeks.get(), 1);

        let frame = source.read_next_frame().expect("Decode error");
        assert_eq!(frame_index(&frame), 5);
        assert_eq!(counters.seeks.get(), 1);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let (mut source, counters) = open_mock(20, SourceOptions::new());

        let error = source.read_frame(Some(1000)).unwrap_err();
        assert!(matches!(
            error,
            LabVideoError::IndexOutOfRange { index: 1000, frame_count: 20, .. }
        ));
        assert!(matches!(
            source.set_frame(20),
            Err(LabVideoError::IndexOutOfRange { index: 20, .. })
        ));
        assert_eq!(counters.decodes.get(), 0);
    }

    #[test]
    fn repeated_read_is_served_from_cache() {
        let (mut source, counters) = open_mock(20, SourceOptions::new());

        let first = source.read_frame(Some(5)).expect("Decode error");
        assert_eq!(counters.seeks.get(), 1);

        let second = source.read_frame(Some(5)).expect("Decode error");
        assert_eq!(counters.seeks.get(), 1, "Second read must not seek");
        assert_eq!(counters.decodes.get(), 1, "Second read must not decode");
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn read_frame_leaves_cursor_alone() {
        let options = SourceOptions::new().with_frame_range(FrameRange::new(2, Some(12), 5));
        let (mut source, _) = open_mock(20, options);

        let frame = source.read_frame(Some(9)).expect("Decode error");
        assert_eq!(frame_index(&frame), 9);
        assert_eq!(source.position(), 2);

        let frame = source.read_next_frame().expect("Decode error");
        assert_eq!(frame_index(&frame), 2);
        assert_eq!(source.position(), 7);
    }

    #[test]
    fn unaligned_set_frame_ends_iteration() {
        let options = SourceOptions::new().with_frame_range(FrameRange::new(0, None, 2));
        let (mut source, _) = open_mock(20, options);

        source.set_frame(3).expect("Seek failed");
        let results: Vec<_> = source.frames().collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(LabVideoError::FrameNotInRange { cursor: 3, .. })
        ));

        source.set_frame(4).expect("Seek failed");
        let frame = source.read_next_frame().expect("Decode error");
        assert_eq!(frame_index(&frame), 4);
    }

    #[test]
    fn exhausted_range_reports_frame_not_in_range() {
        let options = SourceOptions::new().with_frame_range(FrameRange::new(0, Some(2), 1));
        let (mut source, _) = open_mock(20, options);

        source.read_next_frame().expect("Decode error");
        source.read_next_frame().expect("Decode error");
        assert!(matches!(
            source.read_next_frame(),
            Err(LabVideoError::FrameNotInRange { cursor: 2, .. })
        ));
    }

    #[test]
    fn decode_failure_does_not_invalidate_source() {
        let counters = Rc::new(Counters::default());
        let mut backend = CountingBackend::new(5, &counters);
        backend.corrupt = Some(1);
        let mut source =
            FrameSource::from_backend("mock.mp4", Box::new(backend), SourceOptions::new())
                .expect("Failed to open mock source");

        let results: Vec<_> = source.frames().collect();
        assert_eq!(results.len(), 5);
        assert!(matches!(
            results[1],
            Err(LabVideoError::FrameReadError { index: 1, .. })
        ));
        assert!(results.iter().enumerate().all(|(i, r)| i == 1 || r.is_ok()));

        let frame = source.read_frame(Some(0)).expect("Source should remain usable");
        assert_eq!(frame_index(&frame), 0);
    }

    #[test]
    fn mismatched_frame_shape_is_a_read_error() {
        let counters = Rc::new(Counters::default());
        let mut backend = CountingBackend::new(3, &counters);
        backend.oversized = Some(2);
        let mut source =
            FrameSource::from_backend("mock.mp4", Box::new(backend), SourceOptions::new())
                .expect("Failed to open mock source");

        let first = source.read_next_frame().expect("Decode error");
        let second = source.read_next_frame().expect("Decode error");
        assert_eq!(FrameShape::of(&first), FrameShape::of(&second));
        assert!(matches!(
            source.read_next_frame(),
            Err(LabVideoError::FrameReadError { index: 2, .. })
        ));
    }

    #[test]
    fn grayscale_frames_are_two_dimensional() {
        let (mut source, _) = open_mock(4, SourceOptions::new().with_grayscale(true));

        let frame = source.read_next_frame().expect("Decode error");
        assert_eq!(FrameShape::of(&frame).ndim(), 2);
        assert_eq!(source.properties().frame_size.ndim(), 3);
    }

    #[test]
    fn return_function_runs_after_grayscale() {
        let seen = Rc::new(Cell::new(0u8));
        let observed = Rc::clone(&seen);
        let options = SourceOptions::new()
            .with_grayscale(true)
            .with_return_function(move |frame| {
                observed.set(frame.color().channel_count());
                frame.resize_exact(2, 2, image::imageops::FilterType::Nearest)
            });
        let (mut source, _) = open_mock(4, options);

        let frame = source.read_next_frame().expect("Decode error");
        assert_eq!(seen.get(), 1);
        assert_eq!(frame.dimensions(), (2, 2));

        // Transforming the output must not disturb the cached raw frame.
        let again = source.read_frame(Some(0)).expect("Decode error");
        assert_eq!(again.dimensions(), (2, 2));
    }

    #[test]
    fn slice_is_a_view_that_keeps_the_cursor() {
        let (mut source, counters) = open_mock(20, SourceOptions::new());

        let indices: Vec<u8> = source
            .slice(2..7, 2)
            .expect("Invalid slice")
            .map(|frame| frame_index(&frame.expect("Decode error")))
            .collect();
        assert_eq!(indices, vec![2, 4, 6]);
        assert_eq!(source.position(), 0);
        assert_eq!(counters.closes.get(), 0);

        let clamped = source.slice(18.., 1).expect("Invalid slice").count();
        assert_eq!(clamped, 2);
        let first_two = source.slice(..2, 1).expect("Invalid slice").count();
        assert_eq!(first_two, 2);
        assert!(source.slice(.., 0).is_err());
    }

    #[test]
    fn oversized_slice_step_does_not_panic() {
        let (mut source, _) = open_mock(20, SourceOptions::new());
        match source.slice(3.., u64::from(u32::MAX) + 1) {
            Ok(slice) => assert_eq!(slice.count(), 1),
            Err(error) => assert!(matches!(error, LabVideoError::InvalidRange { .. })),
        }
    }

    #[test]
    fn injected_backend_is_labelled_custom() {
        let (source, _) = open_mock(4, SourceOptions::new());
        assert_eq!(source.kind_label(), "custom backend");
    }

    #[test]
    fn length_ignores_range() {
        let options = SourceOptions::new().with_frame_range(FrameRange::new(3, Some(6), 1));
        let (source, _) = open_mock(20, options);
        assert_eq!(source.len(), 20);
        assert_eq!(source.frame_range().len(), 3);
    }

    #[test]
    fn invalid_range_fails_open() {
        let counters = Rc::new(Counters::default());
        let backend = CountingBackend::new(20, &counters);
        let options = SourceOptions::new().with_frame_range(FrameRange::new(0, Some(40), 1));
        let error = FrameSource::from_backend("mock.mp4", Box::new(backend), options).unwrap_err();
        assert!(matches!(error, LabVideoError::InvalidRange { frame_count: 20, .. }));
    }

    #[test]
    fn close_is_idempotent() {
        let (mut source, counters) = open_mock(4, SourceOptions::new());

        source.close();
        source.close();
        assert!(source.is_closed());
        assert_eq!(counters.closes.get(), 1);
        assert!(matches!(
            source.read_next_frame(),
            Err(LabVideoError::SourceClosed { .. })
        ));

        drop(source);
        assert_eq!(counters.closes.get(), 1);
    }

    #[test]
    fn drop_closes_backend() {
        let (source, counters) = open_mock(4, SourceOptions::new());
        drop(source);
        assert_eq!(counters.closes.get(), 1);
    }
}
