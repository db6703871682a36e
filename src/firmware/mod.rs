//! Firmware image selection module
//!
//! Enumerates the update images and the flash script inside an extracted
//! bundle and narrows the images down to the one to flash.

mod filters;
mod models;

pub use filters::{match_board, pick_exact};
pub use models::{FirmwareImage, MatchKind, Selection};

use std::path::{Path, PathBuf};

use crate::config;
use crate::error::{Error, Result};
use crate::{log_debug, log_info};

const MODULE: &str = "firmware";

/// All regular files below `dir`, sorted by path
fn walk_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current)
            .map_err(|e| Error::io("failed to read bundle directory", &current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io("failed to read bundle entry", &current, e))?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Every `*-update.bin` in the bundle; an empty list is a malformed bundle
pub fn list_update_images(bundle_dir: &Path) -> Result<Vec<FirmwareImage>> {
    let images: Vec<FirmwareImage> = walk_files(bundle_dir)?
        .into_iter()
        .map(FirmwareImage::new)
        .filter(|img| img.filename.ends_with(config::firmware::UPDATE_SUFFIX))
        .collect();

    if images.is_empty() {
        return Err(Error::Bundle(format!(
            "no '*{}' images were found inside {}",
            config::firmware::UPDATE_SUFFIX,
            bundle_dir.display()
        )));
    }

    log_debug!(MODULE, "Found {} update images", images.len());
    Ok(images)
}

/// Pick the image for `board`, or hand back every candidate when no board is given
pub fn select_image(bundle_dir: &Path, board: Option<&str>, tag: &str) -> Result<Selection> {
    let images = list_update_images(bundle_dir)?;

    match board.map(str::trim).filter(|b| !b.is_empty()) {
        Some(slug) => match_board(&images, slug, tag).map(Selection::Chosen),
        None => {
            log_info!(
                MODULE,
                "No board given, {} images left for interactive selection",
                images.len()
            );
            Ok(Selection::Candidates(images))
        }
    }
}

/// Locate the flash script, preferring the bundle root, and make it executable
pub fn locate_flash_script(bundle_dir: &Path) -> Result<PathBuf> {
    let name = config::firmware::FLASH_SCRIPT;
    let at_root = bundle_dir.join(name);

    let script = if at_root.is_file() {
        at_root
    } else {
        walk_files(bundle_dir)?
            .into_iter()
            .find(|p| p.file_name().is_some_and(|n| n == name))
            .ok_or_else(|| Error::Bundle(format!("{} not found in extracted firmware bundle", name)))?
    };

    ensure_executable(&script)?;
    log_debug!(MODULE, "Flash script: {}", script.display());
    Ok(script)
}

#[cfg(unix)]
fn ensure_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata =
        std::fs::metadata(path).map_err(|e| Error::io("failed to stat flash script", path, e))?;
    let mode = metadata.permissions().mode();
    if mode & 0o100 == 0 {
        log_debug!(MODULE, "Marking {} executable", path.display());
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode | 0o111))
            .map_err(|e| Error::io("failed to mark flash script executable", path, e))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(_path: &Path) -> Result<()> {
    Ok(())
}
