//! Application configuration constants
//!
//! Grouped by concern so call sites read as `config::download::CHUNK_SIZE`.

pub mod app {
    /// Application name, also used for the cache directory
    pub const NAME: &str = "meshflash";
    /// User agent sent with every HTTP request
    pub const USER_AGENT: &str = concat!("meshflash/", env!("CARGO_PKG_VERSION"));
}

pub mod urls {
    /// GitHub REST API root
    pub const GITHUB_API: &str = "https://api.github.com";
    /// Repository publishing the firmware releases
    pub const DEFAULT_REPO: &str = "meshtastic/firmware";
    /// Page size for the release listing (GitHub maximum)
    pub const RELEASES_PER_PAGE: u32 = 100;
    /// Upper bound on listing pages requested per run
    pub const MAX_RELEASE_PAGES: u32 = 20;
}

pub mod download {
    /// Read buffer for archive decoders
    pub const DECOMPRESS_BUFFER_SIZE: usize = 4 * 1024 * 1024;
    /// Buffer used when hashing downloaded files
    pub const CHUNK_SIZE: usize = 1024 * 1024;
    /// Subdirectory of the cache root holding in-flight downloads
    pub const DOWNLOADS_DIR: &str = ".downloads";
}

pub mod firmware {
    /// Suffix every flashable update image carries
    pub const UPDATE_SUFFIX: &str = "-update.bin";
    /// Prefix of firmware bundle assets and image files
    pub const FILE_PREFIX: &str = "firmware-";
    /// Script shipped in each bundle that performs mode change and flashing
    pub const FLASH_SCRIPT: &str = "device-update.sh";
    /// Environment variable carrying the serial port
    pub const PORT_ENV: &str = "ESPTOOL_PORT";
    /// Executables the flash script delegates to
    pub const ESPTOOL_NAMES: &[&str] = &["esptool.py", "esptool"];
}

pub mod logging {
    /// Log download progress every N megabytes
    pub const DOWNLOAD_LOG_INTERVAL_MB: u64 = 5;
}
