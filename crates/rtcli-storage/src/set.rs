//! The set of script stores owned by one CLI endpoint.

use std::collections::BTreeMap;

use rtcli_types::{CliError, Result, StorageConfig, StorageKind};

use crate::{FileStore, RamStore, ScriptStore};

/// One configured store: its settings plus the buffer itself.
pub struct StoreInstance {
    pub config: StorageConfig,
    pub store: Box<dyn ScriptStore>,
}

impl std::fmt::Debug for StoreInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreInstance")
            .field("handle", &self.config.handle)
            .field("kind", &self.store.kind())
            .field("lines", &self.store.len())
            .finish()
    }
}

/// Handle-to-instance lookup for a single endpoint.
#[derive(Debug, Default)]
pub struct ScriptStores {
    instances: BTreeMap<u8, StoreInstance>,
    default_handle: u8,
}

impl ScriptStores {
    /// An empty set whose omitted-handle default is `default_handle`.
    pub fn new(default_handle: u8) -> Self {
        Self {
            instances: BTreeMap::new(),
            default_handle,
        }
    }

    /// Build every instance described by `configs`, opening file stores.
    pub fn from_config(configs: &[StorageConfig], default_handle: u8) -> Result<Self> {
        let mut set = Self::new(default_handle);
        for config in configs {
            let store: Box<dyn ScriptStore> = match config.kind {
                StorageKind::Ram => Box::new(RamStore::new(config.handle, config.lines)),
                StorageKind::Persistent => {
                    let path = config.path.clone().ok_or_else(|| {
                        CliError::Config(format!(
                            "storage {}: persistent storage requires a path",
                            config.handle
                        ))
                    })?;
                    let store = FileStore::open(config.handle, config.lines, path)?;
                    log::info!(
                        "script {}: persistent store at {}",
                        config.handle,
                        store.path().display()
                    );
                    Box::new(store)
                },
            };
            set.insert(config.clone(), store)?;
        }
        Ok(set)
    }

    /// Register a store. Handles must be unique.
    pub fn insert(&mut self, config: StorageConfig, store: Box<dyn ScriptStore>) -> Result<()> {
        let handle = config.handle;
        if self.instances.contains_key(&handle) {
            return Err(CliError::Config(format!("duplicate storage handle {handle}")));
        }
        self.instances.insert(handle, StoreInstance { config, store });
        Ok(())
    }

    /// Handle used when a command omits one.
    pub fn default_handle(&self) -> u8 {
        self.default_handle
    }

    /// Map an optional handle argument to a concrete handle.
    pub fn resolve(&self, handle: Option<u8>) -> u8 {
        handle.unwrap_or(self.default_handle)
    }

    pub fn get(&self, handle: u8) -> Result<&StoreInstance> {
        self.instances
            .get(&handle)
            .ok_or(CliError::UnknownStore(handle))
    }

    pub fn get_mut(&mut self, handle: u8) -> Result<&mut StoreInstance> {
        self.instances
            .get_mut(&handle)
            .ok_or(CliError::UnknownStore(handle))
    }

    /// Registered handles in ascending order.
    pub fn handles(&self) -> Vec<u8> {
        self.instances.keys().copied().collect()
    }

    /// Handles whose script is flagged to run at boot, ascending.
    pub fn autoexec_handles(&self) -> Vec<u8> {
        self.instances
            .iter()
            .filter(|(_, inst)| inst.store.autoexec() && !inst.store.is_empty())
            .map(|(&handle, _)| handle)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
