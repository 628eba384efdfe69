//! Build script for vid84-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates player.toml and encodes the player config with postcard
//! - Checks the video container and copies it next to the config

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use vid84_core::{prompt, Container, PlayerConfig};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    setup_linker(&out_dir);
    let video_path = load_config(&out_dir);
    embed_video(&out_dir, &video_path);
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate player.toml, write `player.bin`, and return the video path
fn load_config(out_dir: &Path) -> PathBuf {
    println!("cargo:rerun-if-changed=player.toml");

    let config_path = Path::new("player.toml");
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: player.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a player.toml configuration file.         ║\n\
            ║  Please create one in the vid84-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read player.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let document: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in player.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    let video = match document.get("video") {
        Some(toml::Value::String(path)) => Some(PathBuf::from(path)),
        Some(_) => {
            errors.push("'video' must be a path string".to_string());
            None
        }
        None => {
            errors.push("missing 'video' - path of the container to embed".to_string());
            None
        }
    };

    let config = match document.get("player") {
        Some(table @ toml::Value::Table(_)) => match table.clone().try_into::<PlayerConfig>() {
            Ok(config) => config,
            Err(e) => {
                errors.push(format!("[player] {}", e.message()));
                PlayerConfig::reference()
            }
        },
        Some(_) => {
            errors.push("[player] must be a table".to_string());
            PlayerConfig::reference()
        }
        None => PlayerConfig::reference(),
    };

    if let Err(e) = config.validate() {
        errors.push(format!("[player] canvas does not fit the panel: {:?}", e));
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid player configuration                             ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    let encoded = postcard::to_allocvec(&config).unwrap();
    fs::write(out_dir.join("player.bin"), encoded).unwrap();

    println!("cargo:warning=player.toml validated successfully");
    video.unwrap()
}

/// Copy the video into OUT_DIR so main.rs can `include_bytes!` it
///
/// A rejected container is still embedded; the firmware reports it on the
/// panel at startup.
fn embed_video(out_dir: &Path, video_path: &Path) {
    println!("cargo:rerun-if-changed={}", video_path.display());

    let video = match fs::read(video_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read video file                                ║\n\
                ║                                                                  ║\n\
                ║  {:<64} ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                video_path.display(),
                e
            );
        }
    };

    match Container::validate(&video) {
        Ok(container) => {
            let header = container.header();
            println!(
                "cargo:warning=embedding {} ({} bytes, {} fps, scale {})",
                video_path.display(),
                video.len(),
                header.refresh_rate(),
                header.scale_factor()
            );
        }
        Err(e) => {
            println!(
                "cargo:warning={} is not a valid 84VID container: {}",
                video_path.display(),
                prompt::describe(e)
            );
        }
    }

    fs::write(out_dir.join("video.84v"), &video).unwrap();
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
