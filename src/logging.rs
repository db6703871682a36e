//! Logging setup
//!
//! Thin layer over the `log` facade. Every module tags its messages with a
//! `MODULE` string which becomes the log target, so `RUST_LOG=cache=debug`
//! narrows output to one component.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Logger configuration for `verbose` repetitions of `-v`.
///
/// Without `-v` the level is `info` unless `RUST_LOG` says otherwise; `-v`
/// forces debug and `-vv` trace for every target.
fn builder(verbose: u8) -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp(None);
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder
}

/// Install the global logger. A logger that is already installed is kept.
pub fn init(verbose: u8) {
    let _ = builder(verbose).try_init();
}

#[macro_export]
macro_rules! log_info {
    ($module:expr, $($arg:tt)+) => {{
        let target: &str = $module;
        ::log::info!(target: target, $($arg)+);
    }};
}

#[macro_export]
macro_rules! log_warn {
    ($module:expr, $($arg:tt)+) => {{
        let target: &str = $module;
        ::log::warn!(target: target, $($arg)+);
    }};
}

#[macro_export]
macro_rules! log_error {
    ($module:expr, $($arg:tt)+) => {{
        let target: &str = $module;
        ::log::error!(target: target, $($arg)+);
    }};
}

#[macro_export]
macro_rules! log_debug {
    ($module:expr, $($arg:tt)+) => {{
        let target: &str = $module;
        ::log::debug!(target: target, $($arg)+);
    }};
}
