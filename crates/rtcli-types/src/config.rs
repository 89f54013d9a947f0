//! Terminal and script storage configuration (`rtcli.toml`).
//!
//! ```toml
//! [terminal]
//! prompt = "> "
//! default_store = 0
//!
//! [[storage]]
//! handle = 0
//! kind = "ram"
//! lines = 10
//! end_marker = "endScript"
//! prompt = "ram_storage>"
//!
//! [[storage]]
//! handle = 1
//! kind = "persistent"
//! lines = 32
//! path = "flash_script.json"
//! prompt = "flash_storage>"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Largest per-instance line capacity accepted by [`CliConfig::validate`].
pub const MAX_SCRIPT_LINES: usize = 100;

/// Top-level configuration for one CLI endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub terminal: TerminalConfig,
    /// Script storage instances, one per handle.
    #[serde(default = "default_storage")]
    pub storage: Vec<StorageConfig>,
}

/// Settings for the interactive terminal itself.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TerminalConfig {
    /// Prompt shown while idle.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Longest accepted input line in bytes.
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
    /// Storage handle used when a script command omits its handle.
    #[serde(default)]
    pub default_store: u8,
}

/// Storage backend for a script instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Volatile buffer, lost on restart.
    Ram,
    /// File-backed buffer that survives restarts.
    Persistent,
}

/// One script storage instance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    pub handle: u8,
    pub kind: StorageKind,
    /// Number of command lines the instance can hold.
    #[serde(default = "default_lines")]
    pub lines: usize,
    /// Line that concludes script entry.
    #[serde(default = "default_end_marker")]
    pub end_marker: String,
    /// Prompt shown while entering a script into this instance.
    #[serde(default = "default_store_prompt")]
    pub prompt: String,
    /// Execute each line while it is being entered.
    #[serde(default)]
    pub execute_on_entry: bool,
    /// Backing file (persistent instances only).
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Mark a freshly stored persistent script to run at boot.
    #[serde(default = "yes")]
    pub run_on_boot: bool,
}

fn default_prompt() -> String {
    "> ".to_string()
}
fn default_max_line_len() -> usize {
    256
}
fn default_lines() -> usize {
    10
}
fn default_end_marker() -> String {
    "endScript".to_string()
}
fn default_store_prompt() -> String {
    "ram_storage>".to_string()
}
fn yes() -> bool {
    true
}
fn default_storage() -> Vec<StorageConfig> {
    vec![StorageConfig::ram(0)]
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            max_line_len: default_max_line_len(),
            default_store: 0,
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            terminal: TerminalConfig::default(),
            storage: default_storage(),
        }
    }
}

impl StorageConfig {
    /// A RAM instance with the stock settings (10 lines, `endScript`).
    pub fn ram(handle: u8) -> Self {
        Self {
            handle,
            kind: StorageKind::Ram,
            lines: default_lines(),
            end_marker: default_end_marker(),
            prompt: default_store_prompt(),
            execute_on_entry: false,
            path: None,
            run_on_boot: true,
        }
    }

    /// A file-backed instance stored at `path`.
    pub fn persistent(handle: u8, path: impl Into<PathBuf>) -> Self {
        Self {
            kind: StorageKind::Persistent,
            path: Some(path.into()),
            prompt: "flash_storage>".to_string(),
            ..Self::ram(handle)
        }
    }
}

impl CliConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CliConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("loading config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Check cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.terminal.max_line_len == 0 {
            return Err(CliError::Config("max_line_len must be positive".into()));
        }
        let mut seen = HashSet::new();
        for store in &self.storage {
            if !seen.insert(store.handle) {
                return Err(CliError::Config(format!(
                    "duplicate storage handle {}",
                    store.handle
                )));
            }
            if store.lines == 0 || store.lines > MAX_SCRIPT_LINES {
                return Err(CliError::Config(format!(
                    "storage {}: lines must be within 1..={MAX_SCRIPT_LINES}, got {}",
                    store.handle, store.lines
                )));
            }
            if store.end_marker.trim().is_empty() {
                return Err(CliError::Config(format!(
                    "storage {}: end_marker must not be empty",
                    store.handle
                )));
            }
            if store.end_marker.trim() != store.end_marker {
                return Err(CliError::Config(format!(
                    "storage {}: end_marker must not have surrounding whitespace",
                    store.handle
                )));
            }
            if store.kind == StorageKind::Persistent && store.path.is_none() {
                return Err(CliError::Config(format!(
                    "storage {}: persistent storage requires a path",
                    store.handle
                )));
            }
        }
        if !self.storage.is_empty() && self.store(self.terminal.default_store).is_none() {
            return Err(CliError::Config(format!(
                "default_store {} has no storage instance",
                self.terminal.default_store
            )));
        }
        Ok(())
    }

    /// Look up the configuration of one storage handle.
    pub fn store(&self, handle: u8) -> Option<&StorageConfig> {
        self.storage.iter().find(|s| s.handle == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_single_ram_instance() {
        let config = CliConfig::default();
        assert_eq!(config.storage.len(), 1);
        let ram = &config.storage[0];
        assert_eq!(ram.handle, 0);
        assert_eq!(ram.kind, StorageKind::Ram);
        assert_eq!(ram.lines, 10);
        assert_eq!(ram.end_marker, "endScript");
        assert_eq!(ram.prompt, "ram_storage>");
        assert!(!ram.execute_on_entry);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = CliConfig::from_toml_str("").unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn partial_storage_fills_defaults() {
        let config = CliConfig::from_toml_str(
            r#"
            [terminal]
            prompt = "rail> "

            [[storage]]
            handle = 0
            kind = "ram"
            lines = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.terminal.prompt, "rail> ");
        assert_eq!(config.terminal.max_line_len, 256);
        let ram = config.store(0).unwrap();
        assert_eq!(ram.lines, 4);
        assert_eq!(ram.end_marker, "endScript");
    }

    #[test]
    fn persistent_instance_parses() {
        let config = CliConfig::from_toml_str(
            r#"
            [[storage]]
            handle = 0
            kind = "ram"

            [[storage]]
            handle = 1
            kind = "persistent"
            path = "flash.json"
            run_on_boot = false
            "#,
        )
        .unwrap();
        let flash = config.store(1).unwrap();
        assert_eq!(flash.kind, StorageKind::Persistent);
        assert_eq!(flash.path.as_deref(), Some(Path::new("flash.json")));
        assert!(!flash.run_on_boot);
    }

    #[test]
    fn duplicate_handles_rejected() {
        let mut config = CliConfig::default();
        config.storage.push(StorageConfig::ram(0));
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn line_count_bounds() {
        let mut config = CliConfig::default();
        config.storage[0].lines = 0;
        assert!(config.validate().is_err());
        config.storage[0].lines = MAX_SCRIPT_LINES + 1;
        assert!(config.validate().is_err());
        config.storage[0].lines = MAX_SCRIPT_LINES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn persistent_without_path_rejected() {
        let mut config = CliConfig::default();
        let mut flash = StorageConfig::persistent(1, "x.json");
        flash.path = None;
        config.storage.push(flash);
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_end_marker_rejected() {
        let mut config = CliConfig::default();
        config.storage[0].end_marker = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_store_must_exist() {
        let mut config = CliConfig::default();
        config.terminal.default_store = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_kind_is_parse_error() {
        let err = CliConfig::from_toml_str(
            r#"
            [[storage]]
            handle = 0
            kind = "eeprom"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::TomlParse(_)));
    }

    #[test]
    fn persistent_helper_sets_prompt_and_path() {
        let flash = StorageConfig::persistent(1, "s.json");
        assert_eq!(flash.kind, StorageKind::Persistent);
        assert_eq!(flash.prompt, "flash_storage>");
        assert!(flash.run_on_boot);
    }
}
