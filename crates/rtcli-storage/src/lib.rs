//! Script storage for rtcli.
//!
//! A script store is a bounded, ordered buffer of command lines addressed by
//! a small integer handle. Two backends share the [`ScriptStore`] contract:
//! [`RamStore`] (volatile) and [`FileStore`] (survives restarts and carries
//! an autoexec flag). [`ScriptStores`] groups the instances owned by one
//! CLI endpoint together with their configuration.

mod file;
mod memory;
mod set;

pub use file::FileStore;
pub use memory::RamStore;
pub use set::{ScriptStores, StoreInstance};

use rtcli_types::{Result, StorageKind};

/// A bounded buffer of script lines.
pub trait ScriptStore {
    /// Handle this instance is registered under.
    fn handle(&self) -> u8;

    /// Backend flavor.
    fn kind(&self) -> StorageKind;

    /// Maximum number of lines.
    fn capacity(&self) -> usize;

    /// Stored lines in append order.
    fn lines(&self) -> &[String];

    /// Append one line. Fails with `OutOfSpace` when the buffer is full,
    /// leaving the buffer unchanged.
    fn push(&mut self, line: &str) -> Result<()>;

    /// Remove every line and drop the autoexec flag.
    fn clear(&mut self) -> Result<()>;

    /// Flush a completed capture to the backing medium.
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether the script should be replayed at boot.
    fn autoexec(&self) -> bool {
        false
    }

    /// Set the boot replay flag. Volatile stores ignore it.
    fn set_autoexec(&mut self, _enabled: bool) -> Result<()> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.lines().len()
    }

    fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}
