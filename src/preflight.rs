//! Checks that run before any download

use crate::config;
use crate::error::{Error, Result};
use crate::log_debug;
use crate::utils::find_in_path;

const MODULE: &str = "preflight";

/// "'a' (or 'b')" for error messages
fn describe(names: &[&str]) -> String {
    match names.split_first() {
        Some((first, [])) => format!("'{}'", first),
        Some((first, rest)) => format!(
            "'{}' (or {})",
            first,
            rest.iter()
                .map(|n| format!("'{}'", n))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        None => String::new(),
    }
}

/// The flash script shells out to esptool, so it has to be installed
pub fn require_esptool() -> Result<()> {
    match find_in_path(config::firmware::ESPTOOL_NAMES) {
        Some(path) => {
            log_debug!(MODULE, "Found esptool at {}", path.display());
            Ok(())
        }
        None => Err(Error::ToolMissing {
            name: describe(config::firmware::ESPTOOL_NAMES),
            hints: vec![
                "Install with pipx (recommended):".to_string(),
                "  pipx install esptool".to_string(),
                "Or with pip (user):".to_string(),
                "  python3 -m pip install --user esptool".to_string(),
            ],
        }),
    }
}
