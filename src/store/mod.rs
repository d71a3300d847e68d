// src/store/mod.rs

//! Plugin persistence interface.
//!
//! The execution core only ever *reads* plugins: it asks for the current code
//! of an id (single runs, continuous ticks) and for the ordered plugin list
//! (deciding which plugins get a continuous loop).

use std::fmt::Debug;

use crate::errors::Result;
use crate::types::{Plugin, PluginId};

pub mod memory;

pub use memory::MemoryPluginStore;

/// Read access to stored plugins.
pub trait PluginStore: Send + Sync + Debug {
    /// Fetch one plugin. Fails with `ScriptdeckError::PluginNotFound` when the
    /// id is unknown.
    fn get_by_id(&self, id: PluginId) -> Result<Plugin>;

    /// All plugins, ordered by `order_num` then `id`.
    fn get_all(&self) -> Result<Vec<Plugin>>;
}
