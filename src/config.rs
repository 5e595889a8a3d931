//! Configuration loading and management

use anyhow::{bail, Context, Result};

/// Name of the single-instance mutex unless overridden
pub const DEFAULT_INSTANCE_NAME: &str = "Switchy";

/// Default buffer for remap events between the hook thread and the logger
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name of the mutex that keeps a second copy from starting
    pub instance_name: String,

    /// Capacity of the remap event channel
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instance_name: DEFAULT_INSTANCE_NAME.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(name) = lookup("SWITCHY_INSTANCE") {
            if name.trim().is_empty() {
                bail!("SWITCHY_INSTANCE must not be empty");
            }
            config.instance_name = name;
        }

        if let Some(raw) = lookup("SWITCHY_EVENT_CAPACITY") {
            let capacity: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid SWITCHY_EVENT_CAPACITY: {raw:?}"))?;
            if capacity == 0 {
                bail!("SWITCHY_EVENT_CAPACITY must be at least 1");
            }
            config.event_capacity = capacity;
        }

        Ok(config)
    }
}
