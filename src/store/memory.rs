// src/store/memory.rs

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::PluginStore;
use crate::errors::{Result, ScriptdeckError};
use crate::types::{Plugin, PluginId};

/// Thread-safe in-memory plugin store.
///
/// Clones share the same underlying map, so an editor holding one clone can
/// change code that a running continuous loop picks up on its next tick.
#[derive(Debug, Clone, Default)]
pub struct MemoryPluginStore {
    plugins: Arc<RwLock<BTreeMap<PluginId, Plugin>>>,
}

impl MemoryPluginStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_plugins(plugins: impl IntoIterator<Item = Plugin>) -> Self {
        let store = Self::new();
        for plugin in plugins {
            store.upsert(plugin);
        }
        store
    }

    /// Insert or replace the plugin with the same id. Returns the previous
    /// record, if any.
    pub fn upsert(&self, plugin: Plugin) -> Option<Plugin> {
        self.plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(plugin.id, plugin)
    }

    pub fn remove(&self, id: PluginId) -> Option<Plugin> {
        self.plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    pub fn len(&self) -> usize {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look a plugin up by name, or by id when `key` parses as one.
    pub fn find(&self, key: &str) -> Option<Plugin> {
        let plugins = self.plugins.read().unwrap_or_else(PoisonError::into_inner);
        plugins
            .values()
            .find(|p| p.name == key)
            .or_else(|| key.parse::<PluginId>().ok().and_then(|id| plugins.get(&id)))
            .cloned()
    }
}

impl PluginStore for MemoryPluginStore {
    fn get_by_id(&self, id: PluginId) -> Result<Plugin> {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| ScriptdeckError::PluginNotFound(id.to_string()))
    }

    fn get_all(&self) -> Result<Vec<Plugin>> {
        let mut all: Vec<Plugin> = self
            .plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by_key(|p| (p.order_num, p.id));
        Ok(all)
    }
}
