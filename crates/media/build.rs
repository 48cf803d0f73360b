use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap();
    match target_os.as_str() {
        "windows" => copy_ffmpeg_dlls(),
        // FFmpeg's shared libraries are found through the system's library
        // path (`ffmpeg-sys-next` locates them with pkg-config).
        "macos" | "linux" => {}
        _ => panic!("Unsupported target OS `{target_os}`."),
    }
}

/// The player links against FFmpeg's DLLs at runtime, so they need to sit next
/// to the executable (and next to test binaries in `deps`).
fn copy_ffmpeg_dlls() {
    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");

    let ffmpeg_dir = env::var("FFMPEG_DIR")
        .expect("`FFMPEG_DIR` must point at an FFmpeg build with a `bin` directory.");

    let ffmpeg_bin_dir = Path::new(&ffmpeg_dir).join("bin");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let target_dir = out_dir.ancestors().nth(3).unwrap();

    for entry in fs::read_dir(&ffmpeg_bin_dir).unwrap() {
        let entry_path = entry.unwrap().path();

        if entry_path.extension().and_then(|s| s.to_str()) != Some("dll") {
            continue;
        }

        let dll_file_name = entry_path.file_name().unwrap();
        for dest_dir in [target_dir.to_path_buf(), target_dir.join("deps")] {
            fs::copy(&entry_path, dest_dir.join(dll_file_name)).unwrap();
        }
    }
}
