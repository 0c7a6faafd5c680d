use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use labvideo::{
    ExportOptions, FfmpegLogLevel, FrameRange, FrameSource, ProgressCallback, ProgressInfo,
    SourceOptions,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  labvideo info SampleVideo.mp4 --json\n  labvideo info 'recordings/SampleVideo*.png'\n  labvideo extract-frames SampleVideo.mp4 --out frames/SampleVideo --step 10 --progress\n  labvideo completions zsh > _labvideo";

#[derive(Debug, Parser)]
#[command(
    name = "labvideo",
    version,
    about = "Inspect and extract frames from video files and image sequences",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Print every written file.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar while extracting.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the properties of a source.
    #[command(
        about = "Print source properties",
        visible_alias = "probe",
        after_help = "Examples:\n  labvideo info SampleVideo.mp4\n  labvideo info 'SampleVideo*.tiff' --json"
    )]
    Info {
        /// Video file, image file, or quoted image pattern such as 'frames/img*.png'.
        input: PathBuf,

        /// Output properties as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Save frames as numbered images.
    #[command(
        about = "Extract frames to numbered images",
        after_help = "Examples:\n  labvideo extract-frames SampleVideo.mp4 --out frames/SampleVideo\n  labvideo extract-frames SampleVideo.mp4 --out out/f --start 1 --stop 10 --step 2 --gray --ext tiff"
    )]
    ExtractFrames {
        /// Video file, image file, or quoted image pattern.
        input: PathBuf,
        /// Output path stub; the zero-padded frame index and extension are appended.
        #[arg(long)]
        out: PathBuf,
        /// First frame (inclusive).
        #[arg(long, default_value_t = 0)]
        start: u64,
        /// Last frame (exclusive). Defaults to the frame count.
        #[arg(long)]
        stop: Option<u64>,
        /// Distance between extracted frames.
        #[arg(long, default_value_t = 1)]
        step: u64,
        /// Convert frames to grayscale before saving.
        #[arg(long)]
        gray: bool,
        /// Output image extension (png, jpg, jpeg, bmp, tif, tiff).
        #[arg(long, default_value = "png")]
        ext: String,
        /// Width of the zero-padded frame index.
        #[arg(long, default_value_t = 5)]
        digits: usize,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    value.parse().ok()
}

fn parse_image_extension(value: &str) -> Option<String> {
    let cleaned = value.trim_start_matches('.').to_ascii_lowercase();
    match cleaned.as_str() {
        "png" | "jpg" | "jpeg" | "bmp" | "tif" | "tiff" => Some(cleaned),
        _ => None,
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        labvideo::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn warn_if_overwriting(stub: &Path, overwrite: bool) {
    let target_dir = stub.parent().filter(|parent| !parent.as_os_str().is_empty());
    if overwrite && target_dir.is_some_and(Path::exists) {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("existing frames under {} may be replaced", stub.display()).yellow()
        );
    }
}

struct TerminalProgress {
    bar: ProgressBar,
    verbose: bool,
}

impl TerminalProgress {
    fn new(total: u64, verbose: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar, verbose })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        match info.current_frame {
            Some(frame) if self.verbose => self.bar.set_message(format!("frame {frame}")),
            Some(_) => {}
            None => self.bar.finish_with_message("done"),
        }
    }
}

struct VerboseProgress;

impl ProgressCallback for VerboseProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(frame) = info.current_frame {
            eprintln!("{} frame {frame}", "saved".cyan().bold());
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Info { input, json } => {
            let source = FrameSource::open(&input)?;
            let kind = source.kind_label();
            let properties = source.properties();
            if json {
                let payload = json!({
                    "path": input.display().to_string(),
                    "kind": kind,
                    "frame_count": properties.frame_count,
                    "width": properties.width,
                    "height": properties.height,
                    "colour_channels": properties.colour_channels,
                    "frame_size": properties.frame_size.to_string(),
                    "fps": properties.fps,
                    "codec": properties.codec,
                    "file_extension": properties.file_extension,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Source: {} [{kind}]", input.display());
                println!("Frames: {}", properties.frame_count);
                println!(
                    "Frame size: {} ({}x{}, {} channel(s))",
                    properties.frame_size,
                    properties.width,
                    properties.height,
                    properties.colour_channels,
                );
                if properties.fps > 0.0 {
                    println!("Frame rate: {:.2} fps", properties.fps);
                }
                println!("Codec: {}", properties.codec);
            }
        }
        Commands::ExtractFrames {
            input,
            out,
            start,
            stop,
            step,
            gray,
            ext,
            digits,
        } => {
            if step == 0 {
                return Err("--step must be greater than 0".into());
            }
            let ext = parse_image_extension(&ext).ok_or(format!("unsupported --ext: {ext}"))?;

            let options = SourceOptions::new()
                .with_grayscale(gray)
                .with_frame_range(FrameRange::new(start, stop, step));
            let mut source = FrameSource::open_with_options(&input, options)?;

            warn_if_overwriting(&out, cli.global.overwrite);

            let mut export = ExportOptions::new()
                .with_extension(&ext)
                .with_digits(digits)
                .with_overwrite(cli.global.overwrite);
            if cli.global.progress {
                let total = source.frame_range().len();
                export = export.with_progress(Box::new(TerminalProgress::new(
                    total,
                    cli.global.verbose,
                )?));
            } else if cli.global.verbose {
                export = export.with_progress(Box::new(VerboseProgress));
            }

            let written = labvideo::save_frames(&mut source, &out, &export)?;
            source.close();

            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Extracted {} frame(s) to {}*.{ext}", written.len(), out.display())
                    .green()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "labvideo", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
