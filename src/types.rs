use std::time::Duration;

/// Plugin identifier, stable for the plugin's lifetime.
pub type PluginId = i64;

/// A stored plugin as handed out by a [`crate::store::PluginStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub id: PluginId,
    pub name: String,
    pub code: String,
    pub order_num: i64,
    /// Whether the plugin should be invoked on a timer while active.
    pub run_continuously: bool,
    /// Period between automatic invocations. `0` disables continuous mode
    /// even if `run_continuously` is set.
    pub interval_seconds: u64,
}

impl Plugin {
    /// Interval for continuous mode, or `None` when the plugin is not
    /// eligible for it.
    pub fn continuous_interval(&self) -> Option<Duration> {
        if self.run_continuously && self.interval_seconds > 0 {
            Some(Duration::from_secs(self.interval_seconds))
        } else {
            None
        }
    }
}

/// Ephemeral `{id, code}` pair given to the runner at invocation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub id: PluginId,
    pub code: String,
}

impl From<&Plugin> for ExecutionRequest {
    fn from(plugin: &Plugin) -> Self {
        Self {
            id: plugin.id,
            code: plugin.code.clone(),
        }
    }
}
