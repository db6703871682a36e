//! Error types
//!
//! Every failure is terminal for the run; nothing here is retried.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which external tool invocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStep {
    ModeChange,
    Flash,
}

impl fmt::Display for ToolStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolStep::ModeChange => f.write_str("change-mode step"),
            ToolStep::Flash => f.write_str("flash step"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid user input
    #[error("{0}")]
    Configuration(String),

    /// No matching release, asset or image
    #[error("{message}")]
    NotFound { message: String, hint: Option<String> },

    /// More than one image matched and we refuse to guess
    #[error("board '{slug}' matches {} images: {}", candidates.len(), candidates.join(", "))]
    AmbiguousSelection { slug: String, candidates: Vec<String> },

    /// Malformed or unextractable bundle
    #[error("bundle error: {0}")]
    Bundle(String),

    /// External tool exited non-zero or could not be launched
    #[error("{step} failed: {reason}")]
    ExternalTool {
        step: ToolStep,
        code: Option<i32>,
        reason: String,
    },

    /// A required helper executable is not on PATH
    #[error("{name} was not found in your PATH")]
    ToolMissing { name: String, hints: Vec<String> },

    #[error("network error: {0}")]
    Network(String),

    #[error("{context} ({}): {source}", path.display())]
    Io {
        context: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
            hint: None,
        }
    }

    pub fn not_found_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn io(context: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            path: path.into(),
            source,
        }
    }

    /// Remediation text to print below the error, if any
    pub fn hints(&self) -> Vec<String> {
        match self {
            Error::Configuration(_) => vec![format!(
                "e.g., --port /dev/ttyACM0  or  export {}=/dev/ttyACM0",
                crate::config::firmware::PORT_ENV
            )],
            Error::NotFound { hint, .. } => hint.iter().cloned().collect(),
            Error::AmbiguousSelection { slug, candidates } => {
                let mut hints = Vec::new();
                let longer: Vec<&str> = candidates
                    .iter()
                    .map(String::as_str)
                    .filter(|name| names_longer_board(name, slug))
                    .collect();
                if !longer.is_empty() {
                    hints.push(format!(
                        "'{}' is also a prefix of other board names (e.g. t-deck and t-deck-tft): {}",
                        slug,
                        longer.join(", ")
                    ));
                }
                hints.push("Retry without --board and pick the image interactively.".to_string());
                hints
            }
            Error::ToolMissing { hints, .. } => hints.clone(),
            _ => Vec::new(),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Configuration(_) => 2,
            Error::ToolMissing { .. } => 3,
            Error::ExternalTool { code, .. } => match code {
                Some(c) if *c != 0 => *c,
                _ => 1,
            },
            _ => 1,
        }
    }
}

/// True when `filename` carries `-<slug>-` but the next token is not a version,
/// i.e. it belongs to a board whose name extends `slug`
fn names_longer_board(filename: &str, slug: &str) -> bool {
    let lower = filename.to_lowercase();
    let token = format!("-{}-", slug.to_lowercase());
    lower
        .find(&token)
        .map(|at| &lower[at + token.len()..])
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_ascii_digit())
}
