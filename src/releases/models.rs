//! Release data models
//!
//! Types mirror the GitHub releases JSON so they deserialize directly.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
    #[serde(default)]
    pub size: u64,
    /// GitHub-provided digest, e.g. "sha256:<hex>"
    #[serde(default)]
    pub digest: Option<String>,
}

impl AssetDescriptor {
    /// Lowercase SHA256 hex digest, when the release API published a valid one
    pub fn sha256(&self) -> Option<String> {
        let digest = self.digest.as_deref()?;
        let hash = digest
            .strip_prefix("sha256:")
            .unwrap_or(digest)
            .to_lowercase();
        if hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(hash)
        } else {
            None
        }
    }
}

/// A single release as returned by the release source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(rename = "prerelease", default)]
    pub is_prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<AssetDescriptor>,
}

impl ReleaseDescriptor {
    pub fn channel(&self) -> Channel {
        if self.is_prerelease {
            Channel::Alpha
        } else {
            Channel::Stable
        }
    }

    /// Timestamp used for newest-first ordering
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.published_at.or(self.created_at)
    }
}

/// Release track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Stable,
    Alpha,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Stable => "stable",
            Channel::Alpha => "alpha",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which entry of a channel to pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Latest,
    Previous,
}

impl Position {
    pub fn index(&self) -> usize {
        match self {
            Position::Latest => 0,
            Position::Previous => 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Latest => f.write_str("latest"),
            Position::Previous => f.write_str("previous"),
        }
    }
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseQuery {
    pub channel: Channel,
    pub position: Position,
    /// Exact tag; overrides channel and position when set
    pub tag: Option<String>,
}
