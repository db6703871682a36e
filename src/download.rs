//! Download module
//!
//! Streams release assets to disk and verifies their published digest.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use futures_util::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};

use crate::config;
use crate::error::{Error, Result};
use crate::releases::AssetDescriptor;
use crate::utils::{bytes_to_mb, ProgressTracker};
use crate::{log_debug, log_error, log_info};

const MODULE: &str = "download";

/// Something that can place a release asset's bytes at a local path
#[allow(async_fn_in_trait)]
pub trait AssetFetcher {
    /// Write the asset to `dest`, returning the number of bytes written
    async fn fetch(&self, asset: &AssetDescriptor, dest: &Path) -> Result<u64>;
}

/// Stream `url` into `dest` with progress logging
pub async fn download_to_file(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    log_info!(MODULE, "Downloading {}", url);

    let response = client.get(url).send().await.map_err(|e| {
        log_error!(MODULE, "Failed to start download: {}", e);
        Error::Network(format!("failed to start download: {}", e))
    })?;

    if !response.status().is_success() {
        log_error!(MODULE, "Download failed with status: {}", response.status());
        return Err(Error::Network(format!(
            "download failed with status: {}",
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);
    log_info!(
        MODULE,
        "Download size: {} bytes ({:.2} MB)",
        total_size,
        bytes_to_mb(total_size)
    );

    let mut file =
        File::create(dest).map_err(|e| Error::io("failed to create download file", dest, e))?;

    let mut stream = response.bytes_stream();
    let mut tracker = ProgressTracker::new(
        "Download",
        MODULE,
        total_size,
        config::logging::DOWNLOAD_LOG_INTERVAL_MB,
    );

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Network(format!("download error: {}", e)))?;
        file.write_all(&chunk)
            .map_err(|e| Error::io("failed to write chunk", dest, e))?;
        tracker.update(chunk.len() as u64);
    }

    file.flush()
        .map_err(|e| Error::io("failed to flush download", dest, e))?;
    let summary = tracker.finish();
    if total_size > 0 && summary.total_bytes != total_size {
        return Err(Error::Network(format!(
            "download truncated: got {} of {} bytes",
            summary.total_bytes, total_size
        )));
    }
    Ok(summary.total_bytes)
}

/// Calculate SHA256 of a file
pub fn calculate_file_sha256(path: &Path) -> Result<String> {
    log_debug!(MODULE, "Calculating SHA256 of: {}", path.display());

    let mut file = File::open(path).map_err(|e| Error::io("failed to open file for SHA", path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; config::download::CHUNK_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| Error::io("failed to read file for SHA", path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let hash = hex::encode(hasher.finalize());
    log_debug!(MODULE, "Calculated SHA256: {}", hash);
    Ok(hash)
}

/// Check a downloaded asset against the digest published with its release.
/// Assets without a digest are accepted as-is.
pub fn verify_asset_digest(asset: &AssetDescriptor, path: &Path) -> Result<()> {
    let Some(expected) = asset.sha256() else {
        log_debug!(MODULE, "No digest published for {}, skipping verification", asset.name);
        return Ok(());
    };

    let actual = calculate_file_sha256(path)?;
    if expected == actual {
        log_info!(MODULE, "SHA256 verification PASSED");
        Ok(())
    } else {
        log_error!(
            MODULE,
            "SHA256 verification FAILED! Expected: {}, Got: {}",
            expected,
            actual
        );
        Err(Error::Bundle(format!(
            "SHA256 mismatch for {}: expected {}, got {}",
            asset.name, expected, actual
        )))
    }
}
