//! Source classification and image-sequence pattern expansion.
//!
//! A locator is either a container (recognised by extension), a wildcard
//! pattern naming an ordered set of still images (`frames/img*.png`), or a
//! single still image. Pattern wildcards apply to the file name only: `*`
//! matches any run of characters and `?` matches exactly one.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use walkdir::WalkDir;

use crate::container::CONTAINER_EXTENSIONS;
use crate::error::LabVideoError;

/// How a locator is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// An encoded video decoded through FFmpeg.
    Container(PathBuf),
    /// Still images matched by a wildcard pattern, in natural order.
    Sequence(Vec<PathBuf>),
    /// Exactly one still image.
    SingleImage(PathBuf),
}

impl SourceKind {
    /// Short label for log output.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Container(_) => "container",
            SourceKind::Sequence(_) => "image sequence",
            SourceKind::SingleImage(_) => "single image",
        }
    }
}

/// Decide how `locator` should be read.
///
/// # Errors
///
/// - [`LabVideoError::FileOpen`] if a pattern matches no files or its
///   directory cannot be listed.
/// - [`LabVideoError::UnsupportedFormat`] if the locator is neither a known
///   container, a pattern, nor an existing still image.
pub fn classify(locator: &Path) -> Result<SourceKind, LabVideoError> {
    let extension = locator
        .extension()
        .map(|extension| extension.to_string_lossy().into_owned());

    if let Some(extension) = &extension {
        if CONTAINER_EXTENSIONS
            .iter()
            .any(|known| extension.eq_ignore_ascii_case(known))
        {
            return Ok(SourceKind::Container(locator.to_path_buf()));
        }
    }

    let file_name = locator
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    if has_wildcards(&file_name) {
        let paths = expand(locator, &file_name)?;
        return Ok(SourceKind::Sequence(paths));
    }

    if locator.is_file() && is_still_image(locator) {
        return Ok(SourceKind::SingleImage(locator.to_path_buf()));
    }

    Err(LabVideoError::UnsupportedFormat {
        path: locator.to_path_buf(),
        extension,
    })
}

fn has_wildcards(name: &str) -> bool {
    name.contains(['*', '?'])
}

fn is_still_image(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok_and(|format| format.reading_enabled())
}

/// List the still images in the pattern's directory whose names match.
fn expand(locator: &Path, pattern: &str) -> Result<Vec<PathBuf>, LabVideoError> {
    let directory = match locator.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut paths = Vec::new();
    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|error| LabVideoError::FileOpen {
            path: locator.to_path_buf(),
            reason: format!("cannot list {}: {error}", directory.display()),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if wildcard_match(pattern, &name) && is_still_image(entry.path()) {
            paths.push(entry.into_path());
        }
    }

    if paths.is_empty() {
        return Err(LabVideoError::FileOpen {
            path: locator.to_path_buf(),
            reason: "pattern matched no image files".to_string(),
        });
    }

    paths.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    log::debug!("Pattern {} matched {} images", locator.display(), paths.len());
    Ok(paths)
}

/// Match `name` against a `*`/`?` pattern.
pub(crate) fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    // Position of the last `*` and the name index it was tried against.
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    n = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Compare strings treating runs of digits as numbers, so `img2` sorts
/// before `img10`.
pub(crate) fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let left_digits = take_digits(&mut left);
                let right_digits = take_digits(&mut right);
                let ordering = compare_digit_runs(&left_digits, &right_digits);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_match_file_names() {
        assert!(wildcard_match("SampleVideo*.png", "SampleVideo1.png"));
        assert!(wildcard_match("SampleVideo*.png", "SampleVideo.png"));
        assert!(wildcard_match("frame_??.tiff", "frame_07.tiff"));
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("a*b*c", "aXXbYYc"));
        assert!(!wildcard_match("SampleVideo*.png", "SampleVideo1.jpg"));
        assert!(!wildcard_match("frame_??.tiff", "frame_7.tiff"));
        assert!(!wildcard_match("a*b*c", "aXXbYY"));
    }

    #[test]
    fn natural_order_compares_numbers_by_value() {
        let mut names = vec!["img10.png", "img2.png", "img1.png", "img02.png", "img.png"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["img.png", "img1.png", "img2.png", "img02.png", "img10.png"]);
    }

    #[test]
    fn container_extensions_are_case_insensitive() {
        for name in ["clip.mp4", "clip.MP4", "clip.m4v", "clip.avi", "clip.mkv", "clip.webm"] {
            assert!(
                matches!(classify(Path::new(name)), Ok(SourceKind::Container(_))),
                "{name} should be a container",
            );
        }
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let error = classify(Path::new("does/not/exist/clip.xyz")).unwrap_err();
        assert!(matches!(
            error,
            LabVideoError::UnsupportedFormat { extension: Some(ref ext), .. } if ext == "xyz"
        ));
    }

    #[test]
    fn pattern_without_matches_fails_to_open() {
        let directory = tempfile::tempdir().expect("Failed to create temp dir");
        let error = classify(&directory.path().join("missing*.png")).unwrap_err();
        assert!(matches!(error, LabVideoError::FileOpen { .. }));
    }
}
