//! FFmpeg console verbosity.
//!
//! FFmpeg writes its own diagnostics to stderr, independently of the Rust
//! [`log`](https://crates.io/crates/log) facade this crate logs through.
//! Container decoding can be noisy (e.g. warnings about missing timestamps),
//! so the level is exposed here without requiring a direct `ffmpeg-next`
//! dependency.
//!
//! ```no_run
//! use labvideo::{FfmpegLogLevel, FrameSource};
//!
//! labvideo::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! let source = FrameSource::open("SampleVideo.mp4")?;
//! # Ok::<(), labvideo::LabVideoError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use ffmpeg_next::util::log::Level;

/// FFmpeg's `AV_LOG_*` levels, from silent to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// No output.
    Quiet,
    /// Unrecoverable errors that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings. FFmpeg's default.
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging output.
    Debug,
    /// Everything.
    Trace,
}

const LEVELS: [(FfmpegLogLevel, Level, &str); 9] = [
    (FfmpegLogLevel::Quiet, Level::Quiet, "quiet"),
    (FfmpegLogLevel::Panic, Level::Panic, "panic"),
    (FfmpegLogLevel::Fatal, Level::Fatal, "fatal"),
    (FfmpegLogLevel::Error, Level::Error, "error"),
    (FfmpegLogLevel::Warning, Level::Warning, "warning"),
    (FfmpegLogLevel::Info, Level::Info, "info"),
    (FfmpegLogLevel::Verbose, Level::Verbose, "verbose"),
    (FfmpegLogLevel::Debug, Level::Debug, "debug"),
    (FfmpegLogLevel::Trace, Level::Trace, "trace"),
];

impl FfmpegLogLevel {
    fn entry(self) -> &'static (FfmpegLogLevel, Level, &'static str) {
        LEVELS
            .iter()
            .find(|(level, _, _)| *level == self)
            .unwrap_or(&LEVELS[4])
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        self.entry().2
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    /// Parse a level name, case-insensitively. `warn` is accepted for
    /// `warning`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        let value = if value == "warn" { "warning" } else { value.as_str() };
        LEVELS
            .iter()
            .find(|(_, _, name)| *name == value)
            .map(|(level, _, _)| *level)
            .ok_or_else(|| format!("unknown FFmpeg log level: {value}"))
    }
}

/// Set what FFmpeg prints to stderr. Does not affect `log` output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.entry().1);
}

/// The level FFmpeg is currently using, if it maps to a known variant.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    let current = ffmpeg_next::util::log::get_level().ok()?;
    LEVELS
        .iter()
        .find(|(_, level, _)| *level == current)
        .map(|(level, _, _)| *level)
}
