use std::env;
use std::path::PathBuf;

const WATCHED_VARIABLES: [&str; 4] =
    ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn warn(message: &str) {
    println!("cargo:warning={message}");
}

/// Location of a vcpkg FFmpeg install for the configured triplet.
fn vcpkg_ffmpeg_dir(vcpkg_root: &str) -> PathBuf {
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    PathBuf::from(vcpkg_root).join("installed").join(triplet)
}

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // pkg-config finds FFmpeg everywhere except Windows.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows")
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        warn("labvideo needs FFmpeg development libraries. On Windows, install them with vcpkg and set FFMPEG_DIR.");
        return;
    };

    let ffmpeg_dir = vcpkg_ffmpeg_dir(&vcpkg_root);
    if !ffmpeg_dir.exists() {
        warn(&format!(
            "VCPKG_ROOT is set, but {} does not contain an FFmpeg install.",
            ffmpeg_dir.display()
        ));
        return;
    }

    warn(&format!(
        "Found FFmpeg under {}; set FFMPEG_DIR to this path so ffmpeg-next links against it.",
        ffmpeg_dir.display()
    ));
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        warn("Set VCPKGRS_DYNAMIC=1 if the vcpkg FFmpeg build is dynamic.");
    }
}
