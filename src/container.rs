//! FFmpeg-backed decoding of video containers.
//!
//! [`ContainerBackend`] keeps one demuxer, one decoder, and one software
//! scaler open for its whole lifetime. Sequential reads only pull packets;
//! seeking repositions the demuxer on the keyframe at or before the target,
//! flushes the decoder, and discards decoded frames until the target frame
//! comes out.
//!
//! Every decoded frame is numbered from its timestamp and checked against
//! the frame being read, on sequential reads as well as after a seek. If the
//! decoder skips past the requested frame, the read fails with
//! [`LabVideoError::FrameReadError`] and the backend's position follows the
//! decoder, so later reads are never shifted.

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, GrayImage, RgbImage};

use crate::backend::FrameBackend;
use crate::conversion::{
    Reconciled, decoded_frame_number, frame_number_to_seek_timestamp, frame_to_buffer,
    rate_to_fps, reconcile,
};
use crate::error::LabVideoError;
use crate::metadata::VideoProperties;

/// Container extensions decoded through FFmpeg, compared case-insensitively.
pub const CONTAINER_EXTENSIONS: &[&str] = &["mp4", "m4v", "avi", "mkv", "webm"];

/// A video container opened for frame-by-frame decoding.
pub struct ContainerBackend {
    path: PathBuf,
    properties: VideoProperties,
    /// `None` once closed.
    state: Option<DecodeState>,
    /// Frame number the decoder produces next. Decoded frames numbered below
    /// it are dropped; a frame numbered above it means the frame is missing.
    position: u64,
}

struct DecodeState {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    time_base: Rational,
    start_pts: i64,
    /// Stream start in microseconds, added to every seek target.
    start_time: i64,
    frames_per_second: f64,
    width: u32,
    height: u32,
    output_pixel: Pixel,
    decoded: VideoFrame,
    converted: VideoFrame,
    eof_sent: bool,
    /// Number given to the next frame that carries no timestamp.
    next_untimed: u64,
}

impl ContainerBackend {
    /// Open a container and probe its best video stream.
    ///
    /// # Errors
    ///
    /// Returns [`LabVideoError::FileOpen`] if FFmpeg cannot open the file, it
    /// has no video stream, or the stream has no usable frame rate.
    /// Returns [`LabVideoError::FfmpegError`] if the FFmpeg libraries fail to
    /// initialise.
    pub fn open(path: &Path) -> Result<Self, LabVideoError> {
        let open_error = |reason: String| LabVideoError::FileOpen {
            path: path.to_path_buf(),
            reason,
        };

        log::debug!("Opening container: {}", path.display());

        ffmpeg_next::init()?;
        let input =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let (
            stream_index,
            time_base,
            start_pts,
            frames_per_second,
            stream_frames,
            stream_duration,
            parameters,
        ) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| open_error("no video stream found".to_string()))?;

            let frames_per_second = rate_to_fps(stream.avg_frame_rate())
                .or_else(|| rate_to_fps(stream.rate()))
                .ok_or_else(|| open_error("video stream has no frame rate".to_string()))?;

            let start_pts = match stream.start_time() {
                i64::MIN => 0,
                start => start,
            };

            (
                stream.index(),
                stream.time_base(),
                start_pts,
                frames_per_second,
                stream.frames(),
                stream.duration(),
                stream.parameters(),
            )
        };

        let decoder_context = CodecContext::from_parameters(parameters).map_err(|error| {
            open_error(format!("failed to read video codec parameters: {error}"))
        })?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| open_error(format!("failed to create video decoder: {error}")))?;

        let width = decoder.width();
        let height = decoder.height();
        let monochrome = matches!(
            decoder.format(),
            Pixel::GRAY8 | Pixel::GRAY16BE | Pixel::GRAY16LE
        );
        let (output_pixel, colour_channels) = if monochrome {
            (Pixel::GRAY8, 1)
        } else {
            (Pixel::RGB24, 3)
        };

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            output_pixel,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| open_error(format!("failed to create pixel converter: {error}")))?;

        let frame_count = if stream_frames > 0 {
            stream_frames as u64
        } else if stream_duration > 0 {
            let seconds = stream_duration as f64 * time_base.numerator() as f64
                / time_base.denominator() as f64;
            (seconds * frames_per_second).round() as u64
        } else {
            let container_duration = input.duration();
            (container_duration.max(0) as f64 / 1_000_000.0 * frames_per_second).round() as u64
        };

        if frame_count == 0 {
            log::warn!("{} reports no frames", path.display());
        }

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let file_extension = path
            .extension()
            .map(|extension| extension.to_string_lossy().into_owned())
            .unwrap_or_default();

        let properties = VideoProperties::new(
            frame_count,
            width,
            height,
            colour_channels,
            frames_per_second,
            codec,
            file_extension,
        );

        let start_time = start_pts as f64 * time_base.numerator() as f64 * 1_000_000.0
            / time_base.denominator() as f64;

        log::debug!(
            "Probed {}: {} frames, {}x{} @ {:.3} fps [{}]",
            path.display(),
            properties.frame_count,
            width,
            height,
            frames_per_second,
            properties.codec,
        );

        Ok(Self {
            path: path.to_path_buf(),
            properties,
            state: Some(DecodeState {
                input,
                decoder,
                scaler,
                stream_index,
                time_base,
                start_pts,
                start_time: start_time as i64,
                frames_per_second,
                width,
                height,
                output_pixel,
                decoded: VideoFrame::empty(),
                converted: VideoFrame::empty(),
                eof_sent: false,
                next_untimed: 0,
            }),
            position: 0,
        })
    }

    fn read_error(&self, index: u64, reason: impl Into<String>) -> LabVideoError {
        LabVideoError::FrameReadError {
            index,
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn closed(&self) -> LabVideoError {
        LabVideoError::SourceClosed {
            path: self.path.clone(),
        }
    }
}

impl DecodeState {
    /// Decode the next frame into `decoded` and return its frame number, or
    /// `None` once the stream is drained.
    fn receive(&mut self) -> Result<Option<u64>, FfmpegError> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded).is_ok() {
                let number = decoded_frame_number(
                    self.decoded.timestamp().or_else(|| self.decoded.pts()),
                    self.start_pts,
                    self.time_base,
                    self.frames_per_second,
                    self.next_untimed,
                );
                self.next_untimed = number + 1;
                return Ok(Some(number));
            }

            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Convert `decoded` to an owned image.
    fn convert(&mut self) -> Result<DynamicImage, String> {
        self.scaler
            .run(&self.decoded, &mut self.converted)
            .map_err(|error| format!("pixel conversion failed: {error}"))?;

        let (width, height) = (self.width, self.height);
        if self.output_pixel == Pixel::GRAY8 {
            let buffer = frame_to_buffer(&self.converted, width, height, 1);
            GrayImage::from_raw(width, height, buffer)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| "decoded grayscale frame has the wrong size".to_string())
        } else {
            let buffer = frame_to_buffer(&self.converted, width, height, 3);
            RgbImage::from_raw(width, height, buffer)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| "decoded RGB frame has the wrong size".to_string())
        }
    }
}

impl FrameBackend for ContainerBackend {
    fn properties(&self) -> &VideoProperties {
        &self.properties
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, index: u64) -> Result<(), LabVideoError> {
        let Some(state) = self.state.as_mut() else {
            return Err(self.closed());
        };

        let timestamp =
            frame_number_to_seek_timestamp(index, state.frames_per_second, state.start_time);
        log::debug!(
            "Seeking {} to frame {index} (ts={timestamp})",
            self.path.display()
        );

        if let Err(error) = state.input.seek(timestamp, ..timestamp) {
            // The demuxer position is unknown now; force the next read to seek.
            self.position = u64::MAX;
            return Err(self.read_error(index, format!("seek failed: {error}")));
        }
        state.decoder.flush();
        state.eof_sent = false;
        state.next_untimed = index;

        self.position = index;
        Ok(())
    }

    fn decode_next(&mut self) -> Result<DynamicImage, LabVideoError> {
        let index = self.position;
        let Some(state) = self.state.as_mut() else {
            return Err(self.closed());
        };

        // Advance past the frame even when it cannot be decoded.
        let mut next_position = index.saturating_add(1);

        let outcome = loop {
            let number = match state.receive() {
                Ok(Some(number)) => number,
                Ok(None) => break Err("unexpected end of stream".to_string()),
                Err(error) => break Err(error.to_string()),
            };

            match reconcile(number, index) {
                Reconciled::Skip => continue,
                Reconciled::Accept { next } => {
                    next_position = next;
                    break state.convert();
                }
                Reconciled::Missed { next } => {
                    log::debug!(
                        "Frame {index} of {} missing, decoder produced {number}",
                        self.path.display()
                    );
                    next_position = next;
                    break Err(format!("stream has no frame {index}, next is {number}"));
                }
            }
        };

        self.position = next_position;
        outcome.map_err(|reason| self.read_error(index, reason))
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            log::debug!("Closed container {}", self.path.display());
        }
    }
}
