//! External tool invocation
//!
//! A `CommandLine` is the single description of a child process: preview
//! mode prints it and `ProcessRunner` executes it, so both see the same argv.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use crate::log_debug;

const MODULE: &str = "flash::runner";

/// Program, arguments and extra environment for one child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program followed by its arguments
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// Quote `value` for a POSIX shell when needed
fn shell_quote(value: &str) -> Cow<'_, str> {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c));
    if safe {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("'{}'", value.replace('\'', r"'\''")))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<String> = self
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, shell_quote(v)))
            .collect();
        words.extend(self.argv().iter().map(|w| shell_quote(w).into_owned()));
        f.write_str(&words.join(" "))
    }
}

/// Launches external tools. `Ok(None)` means the child had no exit code
/// (terminated by a signal).
pub trait ToolRunner {
    fn run(&mut self, command: &CommandLine) -> std::io::Result<Option<i32>>;
}

impl<R: ToolRunner + ?Sized> ToolRunner for &mut R {
    fn run(&mut self, command: &CommandLine) -> std::io::Result<Option<i32>> {
        (**self).run(command)
    }
}

/// Runs commands as real child processes with inherited stdio
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&mut self, command: &CommandLine) -> std::io::Result<Option<i32>> {
        log_debug!(MODULE, "Spawning {}", command);
        let status = Command::new(&command.program)
            .args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()?;
        log_debug!(MODULE, "{} exited with {}", command.program.display(), status);
        Ok(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_only_when_needed() {
        let cmd = CommandLine::new("/cache/alpha/v2.7.11/esp32s3/device-update.sh")
            .arg("-p")
            .arg("/dev/ttyACM0")
            .arg("-f")
            .arg("/cache/My Images/it's-update.bin")
            .env("ESPTOOL_PORT", "/dev/ttyACM0");
        assert_eq!(
            cmd.to_string(),
            "ESPTOOL_PORT=/dev/ttyACM0 /cache/alpha/v2.7.11/esp32s3/device-update.sh -p /dev/ttyACM0 -f '/cache/My Images/it'\\''s-update.bin'"
        );
    }

    #[test]
    fn test_argv() {
        let cmd = CommandLine::new("tool").arg("--change-mode");
        assert_eq!(cmd.argv(), vec!["tool".to_string(), "--change-mode".to_string()]);
        assert_eq!(shell_quote(""), "''");
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_reports_exit_code() {
        let mut runner = ProcessRunner;
        let ok = CommandLine::new("sh").arg("-c").arg("exit 0");
        let fail = CommandLine::new("sh")
            .arg("-c")
            .arg("exit \"$CODE\"")
            .env("CODE", "3");
        assert_eq!(runner.run(&ok).unwrap(), Some(0));
        assert_eq!(runner.run(&fail).unwrap(), Some(3));
    }

    #[test]
    fn test_process_runner_launch_failure() {
        let mut runner = ProcessRunner;
        let missing = CommandLine::new("/nonexistent/meshflash-tool");
        assert!(runner.run(&missing).is_err());
    }
}
