//! Error types for dtsh.

use std::io;

/// Errors produced by the devicetree shell.
#[derive(Debug, thiserror::Error)]
pub enum DtshError {
    /// Malformed path expression (empty, or not absolute where required).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The path is well formed but no node lives there.
    #[error("no such node: {0}")]
    NotFound(String),

    /// Malformed command invocation.
    #[error("{command}: {message}")]
    Usage { command: String, message: String },

    /// A well formed command failed while executing.
    #[error("{command}: {message}")]
    Command { command: String, message: String },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("redirection error: {0}")]
    Redirection(String),

    /// The command line could not be split into words.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A search criterion or sort key could not be built.
    #[error("{0}")]
    Criterion(String),

    /// Invalid devicetree description.
    #[error("devicetree source error: {0}")]
    Source(String),

    #[error("config error: {0}")]
    Config(String),

    /// The input collaborator has no more lines.
    #[error("end of input")]
    EndOfInput,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DtshError {
    /// Usage error attributed to `command`.
    pub fn usage(command: &str, message: impl Into<String>) -> Self {
        Self::Usage {
            command: command.to_string(),
            message: message.into(),
        }
    }

    /// Execution failure attributed to `command`.
    pub fn command(command: &str, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DtshError>;
