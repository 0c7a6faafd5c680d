//! Frame export integration tests.

use std::cell::Cell;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{ColorType, Rgb, RgbImage};
use labvideo::{
    ExportOptions, FrameRange, FrameSource, LabVideoError, ProgressCallback, ProgressInfo,
    SourceOptions,
};

fn write_sequence(directory: &Path, count: u32) -> PathBuf {
    for number in 1..=count {
        RgbImage::from_pixel(5, 3, Rgb([number as u8, 0, 0]))
            .save(directory.join(format!("SampleVideo{number}.png")))
            .expect("Failed to write fixture frame");
    }
    directory.join("SampleVideo*.png")
}

struct CountingProgress {
    calls: Rc<Cell<u32>>,
    last_current: Rc<Cell<u64>>,
}

impl ProgressCallback for CountingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.calls.set(self.calls.get() + 1);
        self.last_current.set(info.current);
    }
}

#[test]
fn saves_numbered_frames() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let pattern = write_sequence(input.path(), 6);

    let options = SourceOptions::new().with_frame_range(FrameRange::new(1, None, 2));
    let mut source = FrameSource::open_with_options(&pattern, options).expect("Failed to open");

    let stub = output.path().join("frames").join("SampleVideo");
    let written = labvideo::save_frames(&mut source, &stub, &ExportOptions::new())
        .expect("Failed to save frames");

    let names: Vec<String> = written
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["SampleVideo00001.png", "SampleVideo00003.png", "SampleVideo00005.png"]
    );
    for path in &written {
        assert!(path.exists(), "{} should exist", path.display());
    }

    // Index 3 is the fourth file.
    let saved = image::open(&written[1]).expect("Failed to reopen saved frame");
    assert_eq!(saved.to_rgb8().get_pixel(0, 0)[0], 4);
}

#[test]
fn export_applies_grayscale_and_extension() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let pattern = write_sequence(input.path(), 2);

    let options = SourceOptions::new().with_grayscale(true);
    let mut source = FrameSource::open_with_options(&pattern, options).expect("Failed to open");

    let export = ExportOptions::new().with_extension(".TIFF").with_digits(3);
    let written = labvideo::save_frames(&mut source, output.path().join("gray"), &export)
        .expect("Failed to save frames");

    assert_eq!(written[0].file_name().unwrap(), "gray000.tiff");
    let saved = image::open(&written[0]).expect("Failed to reopen saved frame");
    assert_eq!(saved.color(), ColorType::L8);
}

#[test]
fn existing_files_are_not_overwritten_by_default() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let pattern = write_sequence(input.path(), 3);
    let stub = output.path().join("frame");

    let mut source = FrameSource::open(&pattern).expect("Failed to open");
    labvideo::save_frames(&mut source, &stub, &ExportOptions::new())
        .expect("Failed to save frames");

    let mut again = FrameSource::open(&pattern).expect("Failed to open");
    let result = labvideo::save_frames(&mut again, &stub, &ExportOptions::new());
    match result {
        Err(LabVideoError::IoError(error)) => assert_eq!(error.kind(), ErrorKind::AlreadyExists),
        other => panic!("Expected AlreadyExists, got {other:?}"),
    }

    let mut overwrite = FrameSource::open(&pattern).expect("Failed to open");
    let written = labvideo::save_frames(
        &mut overwrite,
        &stub,
        &ExportOptions::new().with_overwrite(true),
    )
    .expect("Overwriting should succeed");
    assert_eq!(written.len(), 3);
}

#[test]
fn export_continues_from_the_cursor() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let pattern = write_sequence(input.path(), 5);

    let mut source = FrameSource::open(&pattern).expect("Failed to open");
    source.read_next_frame().expect("Failed to read frame");
    source.read_next_frame().expect("Failed to read frame");

    let written = labvideo::save_frames(&mut source, output.path().join("f"), &ExportOptions::new())
        .expect("Failed to save frames");
    assert_eq!(written.len(), 3);
    assert_eq!(source.position(), 5);
}

#[test]
fn progress_reports_batches() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let pattern = write_sequence(input.path(), 5);

    let calls = Rc::new(Cell::new(0));
    let last_current = Rc::new(Cell::new(0));
    let export = ExportOptions::new()
        .with_batch_size(2)
        .with_progress(Box::new(CountingProgress {
            calls: Rc::clone(&calls),
            last_current: Rc::clone(&last_current),
        }));

    let mut source = FrameSource::open(&pattern).expect("Failed to open");
    labvideo::save_frames(&mut source, output.path().join("f"), &export)
        .expect("Failed to save frames");

    // After frames 2 and 4, then once at the end.
    assert_eq!(calls.get(), 3);
    assert_eq!(last_current.get(), 5);
}
