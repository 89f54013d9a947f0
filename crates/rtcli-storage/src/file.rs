//! File-backed script storage.
//!
//! Stands in for a flash page: the script and its boot flag are kept as a small JSON document that is rewritten whenever a
//! capture is committed or the script is cleared. Lines pushed during a
//! capture stay in memory until [`ScriptStore::commit`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use rtcli_types::{CliError, Result, StorageKind};

use crate::ScriptStore;

#[derive(Debug, Default, Deserialize, Serialize)]
struct PersistedScript {
    #[serde(default)]
    autoexec: bool,
    #[serde(default)]
    lines: Vec<String>,
}

/// A script buffer persisted to a JSON file.
#[derive(Debug)]
pub struct FileStore {
    handle: u8,
    capacity: usize,
    path: PathBuf,
    lines: Vec<String>,
    autoexec: bool,
}

impl FileStore {
    /// Open the store at `path`, loading any previously saved script.
    ///
    /// A missing or unparsable file yields an empty store; the file is
    /// rewritten on the next commit or clear. A saved script longer than
    /// `capacity` is truncated and loses its autoexec flag, so a partial
    /// script never runs at boot.
    pub fn open(handle: u8, capacity: usize, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let saved = if path.exists() {
            let bytes = std::fs::read(&path)?;
            match serde_json::from_slice::<PersistedScript>(&bytes) {
                Ok(saved) => saved,
                Err(e) => {
                    log::warn!(
                        "script {handle}: {} is unreadable ({e}), starting empty",
                        path.display()
                    );
                    PersistedScript::default()
                },
            }
        } else {
            PersistedScript::default()
        };

        let mut lines = saved.lines;
        let mut autoexec = saved.autoexec;
        if lines.len() > capacity {
            log::warn!(
                "script {handle}: {} holds {} lines, keeping the first {capacity} with autoexec off",
                path.display(),
                lines.len()
            );
            lines.truncate(capacity);
            autoexec = false;
        }
        let autoexec = autoexec && !lines.is_empty();
        log::debug!(
            "script {handle}: opened {} ({} lines, autoexec={autoexec})",
            path.display(),
            lines.len()
        );

        Ok(Self {
            handle,
            capacity,
            path,
            lines,
            autoexec,
        })
    }

    /// Backing file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let doc = PersistedScript {
            autoexec: self.autoexec,
            lines: self.lines.clone(),
        };
        let text = serde_json::to_string_pretty(&doc)?;
        std::fs::write(&self.path, text).map_err(|e| {
            CliError::Storage(format!("cannot write {}: {e}", self.path.display()))
        })
    }
}

impl ScriptStore for FileStore {
    fn handle(&self) -> u8 {
        self.handle
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Persistent
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn lines(&self) -> &[String] {
        &self.lines
    }

    fn push(&mut self, line: &str) -> Result<()> {
        if self.lines.len() >= self.capacity {
            return Err(CliError::OutOfSpace {
                handle: self.handle,
                capacity: self.capacity,
            });
        }
        self.lines.push(line.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.lines.clear();
        self.autoexec = false;
        self.persist()
    }

    fn commit(&mut self) -> Result<()> {
        self.persist()
    }

    fn autoexec(&self) -> bool {
        self.autoexec
    }

    fn set_autoexec(&mut self, enabled: bool) -> Result<()> {
        self.autoexec = enabled;
        self.persist()
    }
}
