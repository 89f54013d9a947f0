//! Foundation types for rtcli.
//!
//! This crate contains the types shared by every rtcli crate: the error
//! taxonomy, argument kinds used by command signatures, and the TOML
//! configuration for terminals and script storage instances.

pub mod arg_kind;
pub mod config;
pub mod error;

pub use arg_kind::ArgKind;
pub use config::{CliConfig, StorageConfig, StorageKind, TerminalConfig};
pub use error::{CliError, Result};
