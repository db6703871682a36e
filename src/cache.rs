//! Bundle cache
//!
//! One directory per (channel, tag, platform). A populated directory is a
//! hit and is returned without touching the network; misses are downloaded,
//! extracted into a staging directory and renamed into place.

use std::path::{Path, PathBuf};

use crate::archive::extract_archive;
use crate::config;
use crate::download::{verify_asset_digest, AssetFetcher};
use crate::error::{Error, Result};
use crate::releases::{AssetDescriptor, Channel, ReleaseDescriptor};
use crate::utils::{archive_ext, format_size, sanitize_component};
use crate::{log_debug, log_info, log_warn};

const MODULE: &str = "cache";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub channel: Channel,
    pub tag: String,
    pub platform: String,
}

impl CacheKey {
    pub fn new(release: &ReleaseDescriptor, platform: &str) -> Self {
        Self {
            channel: release.channel(),
            tag: release.tag.clone(),
            platform: platform.trim().to_lowercase(),
        }
    }

    /// `<channel>/<tag>/<platform>` below the cache root
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(self.channel.as_str())
            .join(sanitize_component(&self.tag))
            .join(sanitize_component(&self.platform))
    }
}

/// A resolved cache entry
#[derive(Debug, Clone)]
pub struct BundleCacheEntry {
    pub path: PathBuf,
    /// Name of the bundle asset, when it can be determined from the release
    pub asset_name: Option<String>,
    /// True when this run downloaded the bundle
    pub downloaded: bool,
}

/// Find the single bundle asset for `platform`.
///
/// Names must look like `firmware-<platform>-…<archive ext>`; the trailing
/// dash keeps `esp32` from matching `esp32s3` bundles.
pub fn pick_asset<'a>(release: &'a ReleaseDescriptor, platform: &str) -> Result<&'a AssetDescriptor> {
    let prefix = format!(
        "{}{}-",
        config::firmware::FILE_PREFIX,
        platform.trim().to_lowercase()
    );
    let matches: Vec<&AssetDescriptor> = release
        .assets
        .iter()
        .filter(|a| a.name.to_lowercase().starts_with(&prefix) && archive_ext(&a.name).is_some())
        .collect();

    match matches.as_slice() {
        [asset] => Ok(asset),
        [] => Err(Error::not_found_with_hint(
            format!(
                "no firmware bundle found for platform '{}' in release {}",
                platform, release.tag
            ),
            "Check --firmware, or pick another release with --tag",
        )),
        many => Err(Error::not_found(format!(
            "{} bundles match platform '{}' in release {}: {}",
            many.len(),
            platform,
            release.tag,
            many.iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

fn is_populated(dir: &Path) -> bool {
    dir.is_dir()
        && std::fs::read_dir(dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
}

pub struct BundleCache {
    root: PathBuf,
}

impl BundleCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.relative_dir())
    }

    /// Path of a populated entry, if present
    pub fn lookup(&self, key: &CacheKey) -> Option<PathBuf> {
        let dir = self.entry_dir(key);
        is_populated(&dir).then_some(dir)
    }

    /// Return the bundle directory for `release`/`platform`, fetching it on a miss
    pub async fn ensure_bundle<F: AssetFetcher>(
        &self,
        release: &ReleaseDescriptor,
        platform: &str,
        fetcher: &F,
    ) -> Result<BundleCacheEntry> {
        let key = CacheKey::new(release, platform);

        if let Some(path) = self.lookup(&key) {
            log_info!(MODULE, "Using cached bundle: {}", path.display());
            return Ok(BundleCacheEntry {
                asset_name: pick_asset(release, platform).ok().map(|a| a.name.clone()),
                path,
                downloaded: false,
            });
        }

        let asset = pick_asset(release, platform)?;
        let target = self.entry_dir(&key);
        log_info!(
            MODULE,
            "Cache miss for {}, fetching {} ({})",
            key.relative_dir().display(),
            asset.name,
            format_size(asset.size)
        );

        let temp_path = self.download_path(asset);
        if let Some(parent) = temp_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::io("failed to create download directory", parent, e))?;
        }

        if let Err(e) = fetcher.fetch(asset, &temp_path).await {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }

        let staging = staging_path(&target);
        let staged = stage_bundle(&temp_path, asset, &staging);
        let _ = std::fs::remove_file(&temp_path);
        let published = match staged.and_then(|_| publish(&staging, &target)) {
            Ok(published) => published,
            Err(e) => {
                log_warn!(MODULE, "Rolling back staging directory {}", staging.display());
                let _ = std::fs::remove_dir_all(&staging);
                return Err(e);
            }
        };

        if published {
            log_info!(MODULE, "Bundle cached at {}", target.display());
        } else {
            log_info!(
                MODULE,
                "Another run already cached {}, using it",
                target.display()
            );
        }
        Ok(BundleCacheEntry {
            path: target,
            asset_name: Some(asset.name.clone()),
            downloaded: published,
        })
    }

    /// Per-process scratch file for an in-flight download of `asset`
    fn download_path(&self, asset: &AssetDescriptor) -> PathBuf {
        self.root.join(config::download::DOWNLOADS_DIR).join(format!(
            "{}.{}.downloading",
            sanitize_component(&asset.name),
            std::process::id()
        ))
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!("{}.staging-{}", name, std::process::id()))
}

/// Verify and unpack the downloaded archive into a fresh staging directory
fn stage_bundle(archive: &Path, asset: &AssetDescriptor, staging: &Path) -> Result<()> {
    verify_asset_digest(asset, archive)?;

    if staging.exists() {
        log_debug!(MODULE, "Removing stale staging directory {}", staging.display());
        std::fs::remove_dir_all(staging)
            .map_err(|e| Error::io("failed to clear staging directory", staging, e))?;
    }

    extract_archive(archive, &asset.name, staging)?;

    if !is_populated(staging) {
        return Err(Error::Bundle(format!("{} is empty", asset.name)));
    }
    Ok(())
}

/// Move a completed staging directory into its final place.
///
/// Returns `false` when a concurrent run published the entry first; the
/// staging directory is discarded and the published entry is left untouched.
fn publish(staging: &Path, target: &Path) -> Result<bool> {
    if is_populated(target) {
        std::fs::remove_dir_all(staging)
            .map_err(|e| Error::io("failed to discard staging directory", staging, e))?;
        return Ok(false);
    }
    if target.exists() {
        std::fs::remove_dir(target)
            .map_err(|e| Error::io("failed to remove empty cache entry", target, e))?;
    }
    match std::fs::rename(staging, target) {
        Ok(()) => Ok(true),
        // lost the race between the check above and the rename
        Err(_) if is_populated(target) => {
            let _ = std::fs::remove_dir_all(staging);
            Ok(false)
        }
        Err(e) => Err(Error::io("failed to publish cache entry", target, e)),
    }
}
