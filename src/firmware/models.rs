//! Firmware image models

use std::path::PathBuf;

/// How a board slug matched an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// `firmware-<slug>-<version>-update.bin` exactly
    Exact,
    /// Slug token and update suffix present, version differs
    Loose,
}

/// An update image found inside a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    pub path: PathBuf,
    pub filename: String,
    pub match_kind: Option<MatchKind>,
}

impl FirmwareImage {
    pub fn new(path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            filename,
            match_kind: None,
        }
    }
}

/// Outcome of image selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A board slug resolved to exactly one image
    Chosen(FirmwareImage),
    /// No slug given; the caller has to pick one of these
    Candidates(Vec<FirmwareImage>),
}
