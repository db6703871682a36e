//! Archive extraction module
//!
//! Unpacks platform bundles (zip or compressed tarballs) into a directory
//! using Rust native decoders.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use lzma_rust2::XzReaderMt;
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::config;
use crate::error::{Error, Result};
use crate::utils::{archive_ext, get_recommended_threads};
use crate::{log_debug, log_info};

const MODULE: &str = "archive";

/// Supported bundle formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    TarXz,
    TarBz2,
    TarZst,
}

impl ArchiveKind {
    /// Detect the format from a file name
    pub fn from_name(name: &str) -> Option<Self> {
        match archive_ext(name)? {
            ".zip" => Some(ArchiveKind::Zip),
            ".tar.gz" | ".tgz" => Some(ArchiveKind::TarGz),
            ".tar.xz" => Some(ArchiveKind::TarXz),
            ".tar.bz2" => Some(ArchiveKind::TarBz2),
            ".tar.zst" => Some(ArchiveKind::TarZst),
            _ => None,
        }
    }
}

/// Extract `archive` into `dest` (created if missing).
///
/// The format is taken from `name`, the asset's file name, since the local
/// download path carries a temporary suffix.
pub fn extract_archive(archive: &Path, name: &str, dest: &Path) -> Result<()> {
    let kind = ArchiveKind::from_name(name)
        .ok_or_else(|| Error::Bundle(format!("unsupported archive format: {}", name)))?;

    std::fs::create_dir_all(dest)
        .map_err(|e| Error::io("failed to create extraction directory", dest, e))?;

    log_info!(MODULE, "Extracting {} ({:?}) to {}", name, kind, dest.display());

    let file = File::open(archive).map_err(|e| Error::io("failed to open archive", archive, e))?;

    match kind {
        ArchiveKind::Zip => extract_zip(file, dest),
        ArchiveKind::TarGz => {
            let reader = BufReader::with_capacity(config::download::DECOMPRESS_BUFFER_SIZE, file);
            extract_tar(GzDecoder::new(reader), dest, "gz")
        }
        ArchiveKind::TarXz => {
            let threads = get_recommended_threads();
            log_debug!(MODULE, "Using {} threads for XZ decompression", threads);
            let decoder = XzReaderMt::new(file, false, threads as u32)
                .map_err(|e| Error::Bundle(format!("failed to create XZ decoder: {}", e)))?;
            extract_tar(decoder, dest, "xz")
        }
        ArchiveKind::TarBz2 => {
            let reader = BufReader::with_capacity(config::download::DECOMPRESS_BUFFER_SIZE, file);
            extract_tar(BzDecoder::new(reader), dest, "bz2")
        }
        ArchiveKind::TarZst => {
            let reader = BufReader::with_capacity(config::download::DECOMPRESS_BUFFER_SIZE, file);
            let decoder = ZstdDecoder::new(reader)
                .map_err(|e| Error::Bundle(format!("failed to create zstd decoder: {}", e)))?;
            extract_tar(decoder, dest, "zstd")
        }
    }?;

    log_info!(MODULE, "Extraction complete");
    Ok(())
}

fn extract_zip(file: File, dest: &Path) -> Result<()> {
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| Error::Bundle(format!("invalid zip archive: {}", e)))?;
    log_debug!(MODULE, "Zip archive has {} entries", zip.len());
    zip.extract(dest)
        .map_err(|e| Error::Bundle(format!("zip extraction error: {}", e)))
}

/// Unpack a tar stream; `tar` refuses entries escaping `dest`
fn extract_tar<R: Read>(decoder: R, dest: &Path, format_name: &str) -> Result<()> {
    let mut archive = tar::Archive::new(decoder);
    archive
        .unpack(dest)
        .map_err(|e| Error::Bundle(format!("tar.{} extraction error: {}", format_name, e)))
}
