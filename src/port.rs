//! Serial port resolution

use crate::config;
use crate::error::{Error, Result};
use crate::log_debug;

const MODULE: &str = "port";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Explicit port first, then the environment fallback
pub fn resolve_port(explicit: Option<&str>, from_env: Option<&str>) -> Result<String> {
    if let Some(port) = non_empty(explicit) {
        log_debug!(MODULE, "Using port from command line: {}", port);
        return Ok(port.to_string());
    }
    if let Some(port) = non_empty(from_env) {
        log_debug!(MODULE, "Using port from {}: {}", config::firmware::PORT_ENV, port);
        return Ok(port.to_string());
    }
    Err(Error::Configuration(format!(
        "no port specified: {} is not set. Use --port or set the env var.",
        config::firmware::PORT_ENV
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_wins() {
        assert_eq!(
            resolve_port(Some("/dev/ttyACM0"), Some("/dev/ttyUSB0")).unwrap(),
            "/dev/ttyACM0"
        );
    }

    #[test]
    fn test_env_fallback() {
        assert_eq!(resolve_port(None, Some(" /dev/ttyUSB0\n")).unwrap(), "/dev/ttyUSB0");
        assert_eq!(resolve_port(Some("  "), Some("COM3")).unwrap(), "COM3");
    }

    #[test]
    fn test_missing_port_is_configuration_error() {
        for (explicit, env) in [(None, None), (Some(""), Some("   "))] {
            let err = resolve_port(explicit, env).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)));
            assert_eq!(err.exit_code(), 2);
        }
    }
}
