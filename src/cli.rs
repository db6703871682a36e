//! CLI argument parsing

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config;
use crate::releases::{Channel, Position, ReleaseQuery};

/// Platform bundles published with each release
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Platform {
    #[value(name = "esp32")]
    Esp32,
    #[value(name = "esp32s3")]
    Esp32s3,
    #[value(name = "nrf52")]
    Nrf52,
    #[value(name = "rp2040")]
    Rp2040,
}

impl Platform {
    /// Token used in bundle asset names
    pub fn token(&self) -> &'static str {
        match self {
            Platform::Esp32 => "esp32",
            Platform::Esp32s3 => "esp32s3",
            Platform::Nrf52 => "nrf52",
            Platform::Rp2040 => "rp2040",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "meshflash")]
#[command(
    author,
    version,
    about = "Download and flash Meshtastic firmware using device-update.sh (honors ESPTOOL_PORT)",
    long_about = None
)]
pub struct Cli {
    /// Target platform bundle to download
    #[arg(long, value_enum)]
    pub firmware: Platform,

    /// Exact board slug (e.g., tlora-t3s3-v1); auto-selects the matching image
    #[arg(long)]
    pub board: Option<String>,

    /// Serial port for flashing; overrides ESPTOOL_PORT (e.g., /dev/ttyACM0)
    #[arg(long)]
    pub port: Option<String>,

    /// Run the change-mode step before flashing; the run stops if it fails
    #[arg(long)]
    pub change_mode: bool,

    /// Use the previous release instead of the latest in the chosen channel
    #[arg(long)]
    pub previous: bool,

    /// Use the alpha (prerelease) channel instead of stable
    #[arg(long)]
    pub alpha: bool,

    /// Use a specific release tag, e.g. v2.7.11.ee68575 (overrides --alpha/--previous)
    #[arg(long)]
    pub tag: Option<String>,

    /// Where to download and extract firmware bundles [default: user cache dir]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// GitHub repository publishing the releases
    #[arg(long, default_value = config::urls::DEFAULT_REPO)]
    pub repo: String,

    /// GitHub API token, lifts anonymous rate limits
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Print actions without executing flashing steps
    #[arg(long)]
    pub dry_run: bool,

    /// Do not prompt before flashing (still prompts for an image without --board)
    #[arg(long)]
    pub yes: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn release_query(&self) -> ReleaseQuery {
        ReleaseQuery {
            channel: if self.alpha {
                Channel::Alpha
            } else {
                Channel::Stable
            },
            position: if self.previous {
                Position::Previous
            } else {
                Position::Latest
            },
            tag: self
                .tag
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_release_query_from_flags() {
        let cli = Cli::parse_from([
            "meshflash",
            "--firmware",
            "esp32s3",
            "--alpha",
            "--previous",
        ]);
        let query = cli.release_query();
        assert_eq!(query.channel, Channel::Alpha);
        assert_eq!(query.position, Position::Previous);
        assert_eq!(query.tag, None);
        assert_eq!(cli.firmware.token(), "esp32s3");
        assert_eq!(cli.repo, "meshtastic/firmware");
    }

    #[test]
    fn test_blank_tag_is_ignored() {
        let cli = Cli::parse_from(["meshflash", "--firmware", "nrf52", "--tag", " "]);
        assert_eq!(cli.release_query().tag, None);
        assert_eq!(cli.release_query().channel, Channel::Stable);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::parse_from([
            "meshflash",
            "--firmware",
            "esp32",
            "--board",
            "tlora-t3s3-v1",
            "--port",
            "/dev/ttyACM0",
            "--change-mode",
            "--tag",
            "v2.7.11.ee68575",
            "--output-dir",
            "/tmp/fw",
            "--dry-run",
            "--yes",
            "-vv",
        ]);
        assert_eq!(cli.firmware, Platform::Esp32);
        assert_eq!(cli.board.as_deref(), Some("tlora-t3s3-v1"));
        assert!(cli.change_mode && cli.dry_run && cli.yes);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.release_query().tag.as_deref(), Some("v2.7.11.ee68575"));
    }

    #[test]
    fn test_firmware_is_required() {
        assert!(Cli::try_parse_from(["meshflash"]).is_err());
        assert!(Cli::try_parse_from(["meshflash", "--firmware", "stm32"]).is_err());
    }
}
