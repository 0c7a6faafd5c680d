//! Internal conversion helpers for the container backend.
//!
//! Pixel copying out of FFmpeg frames, and arithmetic between presentation
//! timestamps, frame numbers, and demuxer seek targets.

use std::cmp::Ordering;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy plane 0 of a packed FFmpeg frame into a tightly-packed owned buffer.
///
/// FFmpeg rows are often padded (stride > width × bytes per pixel) and the
/// frame's storage is reused by the next decode, so the copy is mandatory.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * bytes_per_pixel;
    let rows = height as usize;
    let data = video_frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * rows].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * rows);
    for row in data.chunks(stride).take(rows) {
        buffer.extend_from_slice(&row[..row_bytes]);
    }
    buffer
}

/// Frames per second from a stream rate, or `None` if the rate is unset.
pub(crate) fn rate_to_fps(rate: Rational) -> Option<f64> {
    if rate.numerator() > 0 && rate.denominator() > 0 {
        Some(rate.numerator() as f64 / rate.denominator() as f64)
    } else {
        None
    }
}

/// Zero-based frame number of a presentation timestamp.
///
/// `start_pts` is the stream's first timestamp, so containers whose first
/// frame is not at zero still number from zero. Rounds to the nearest frame
/// to absorb time-base truncation.
pub(crate) fn pts_to_frame_number(
    pts: i64,
    start_pts: i64,
    time_base: Rational,
    frames_per_second: f64,
) -> u64 {
    let ticks = pts.saturating_sub(start_pts).max(0) as f64;
    let seconds = ticks * time_base.numerator() as f64 / time_base.denominator() as f64;
    (seconds * frames_per_second).round() as u64
}

/// Frame number of a decoded frame: from its timestamp when it has one,
/// otherwise `next_untimed`, one past the previous frame.
pub(crate) fn decoded_frame_number(
    pts: Option<i64>,
    start_pts: i64,
    time_base: Rational,
    frames_per_second: f64,
    next_untimed: u64,
) -> u64 {
    match pts {
        Some(pts) => pts_to_frame_number(pts, start_pts, time_base, frames_per_second),
        None => next_untimed,
    }
}

/// What to do with a decoded frame while reading frame `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reconciled {
    /// Earlier than the target. Drop it and keep decoding.
    Skip,
    /// The target frame. The decoder will produce `next` after it.
    Accept { next: u64 },
    /// The decoder moved past the target without producing it. It will
    /// produce `next` after the frame it did decode.
    Missed { next: u64 },
}

/// Compare a decoded frame number with the frame being read.
///
/// The `next` positions always describe where the decoder really is, so a
/// gap in the stream is never papered over by relabelling a later frame.
pub(crate) fn reconcile(number: u64, target: u64) -> Reconciled {
    match number.cmp(&target) {
        Ordering::Less => Reconciled::Skip,
        Ordering::Equal => Reconciled::Accept {
            next: number.saturating_add(1),
        },
        Ordering::Greater => Reconciled::Missed {
            next: number.saturating_add(1),
        },
    }
}

/// Demuxer seek target for a frame number, in `AV_TIME_BASE` (microseconds).
///
/// `Input::seek` goes through `avformat_seek_file` with no stream index, which
/// expects microseconds. `start_time` is the container start in the same unit.
pub(crate) fn frame_number_to_seek_timestamp(
    frame_number: u64,
    frames_per_second: f64,
    start_time: i64,
) -> i64 {
    let seconds = frame_number as f64 / frames_per_second;
    start_time.max(0) + (seconds * 1_000_000.0) as i64
}
