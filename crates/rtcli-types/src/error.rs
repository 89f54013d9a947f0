//! Error types for rtcli.

use std::io;

use crate::arg_kind::ArgKind;

/// Errors produced by the rtcli framework.
///
/// Everything above `InvalidRegistry` is a recoverable per-line diagnostic:
/// the session reports it and keeps accepting input.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("unknown command: {token}{}", in_group(.group_path))]
    UnknownCommand { token: String, group_path: String },

    #[error("missing argument {index}: expected {kind}")]
    MissingArgument { index: usize, kind: ArgKind },

    #[error("argument {index}: '{raw}' is not a valid {kind}")]
    Range {
        index: usize,
        kind: ArgKind,
        raw: String,
    },

    #[error("too many arguments: unexpected argument {index}")]
    TooManyArguments { index: usize },

    #[error("busy: '{command}' is not allowed while {mode}")]
    Busy { command: String, mode: String },

    #[error("out of space: script {handle} holds at most {capacity} lines")]
    OutOfSpace { handle: u8, capacity: usize },

    #[error("no script storage with handle {0}")]
    UnknownStore(u8),

    #[error("line too long: {len} bytes (max {max})")]
    LineTooLong { len: usize, max: usize },

    #[error("registry error: {0}")]
    InvalidRegistry(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("command error: {0}")]
    Command(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn in_group(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" (in '{path}')")
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CliError>;
