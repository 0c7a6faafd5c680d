//! # labvideo
//!
//! Read frames from laboratory video recordings, whether they were saved as a
//! container file (`.mp4`, `.avi`, `.mkv`, ...), as a numbered image
//! sequence, or as a single still image.
//!
//! Every kind of recording is exposed through the same [`FrameSource`]:
//! random access by absolute frame index, sequential reads over a
//! `(start, stop, step)` range, iteration, and lazy slicing. Frames come back
//! as [`image::DynamicImage`] values. Containers are decoded with FFmpeg via
//! the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; image
//! sequences are decoded with the [`image`](https://crates.io/crates/image)
//! crate.
//!
//! ## Quick Start
//!
//! ### Read a Single Frame
//!
//! ```no_run
//! use labvideo::FrameSource;
//!
//! let mut source = FrameSource::open("SampleVideo.mp4").unwrap();
//! let frame = source.read_frame(Some(0)).unwrap();
//! frame.save("first_frame.png").unwrap();
//! ```
//!
//! ### Iterate Over a Strided Range
//!
//! ```no_run
//! use labvideo::{FrameRange, FrameSource, SourceOptions};
//!
//! let options = SourceOptions::new()
//!     .with_grayscale(true)
//!     .with_frame_range(FrameRange::new(1, Some(10), 2));
//! let mut source = FrameSource::open_with_options("SampleVideo.mp4", options).unwrap();
//!
//! // Frames 1, 3, 5, 7 and 9
//! for frame in source.frames() {
//!     let frame = frame.unwrap();
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! ```
//!
//! ### Open an Image Sequence
//!
//! ```no_run
//! use labvideo::FrameSource;
//!
//! // SampleVideo1.png, SampleVideo2.png, ..., SampleVideo10.png in natural order
//! let mut source = FrameSource::open("recordings/SampleVideo*.png").unwrap();
//! println!("{} frames", source.len());
//!
//! // Every other frame of the first ten, without moving the read cursor
//! for frame in source.slice(0..10, 2).unwrap() {
//!     let _frame = frame.unwrap();
//! }
//! ```
//!
//! ### Export Frames
//!
//! ```no_run
//! use labvideo::{ExportOptions, FrameSource};
//!
//! let mut source = FrameSource::open("SampleVideo.mp4").unwrap();
//! let written = labvideo::save_frames(&mut source, "frames/SampleVideo", &ExportOptions::new())
//!     .unwrap();
//! println!("wrote {} files", written.len());
//! ```
//!
//! ## Features
//!
//! - **One interface** for containers, image sequences and single images
//! - **Frame ranges** with `start`, `stop` and `step`, validated at open time
//! - **One-frame cache** so re-reading the current frame costs nothing
//! - **Minimal seeking**: the decoder only seeks when a read is neither cached
//!   nor at its current position
//! - **Grayscale conversion** and a user-supplied return function applied to
//!   every frame
//! - **Numbered image export** with progress callbacks
//! - **Pluggable backends** through the [`FrameBackend`] trait
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system for
//! `ffmpeg-next` to build.

pub mod backend;
pub mod container;
mod conversion;
pub mod error;
pub mod export;
pub mod ffmpeg;
pub mod metadata;
pub mod options;
pub mod pattern;
pub mod progress;
pub mod range;
pub mod sequence;
pub mod source;

pub use backend::FrameBackend;
pub use container::{CONTAINER_EXTENSIONS, ContainerBackend};
pub use error::LabVideoError;
pub use export::{ExportOptions, frame_suffix, save_frames};
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use metadata::{FrameShape, VideoProperties};
pub use options::{ReturnFunction, SourceOptions};
pub use pattern::{SourceKind, classify};
pub use progress::{ProgressCallback, ProgressInfo};
pub use range::{FrameRange, ResolvedRange};
pub use sequence::SequenceBackend;
pub use source::{FrameSlice, FrameSource, Frames};
