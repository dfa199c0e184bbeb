pub mod call;
pub mod config;
pub mod contract;
pub mod run;

use anyhow::{Context, Result};
use std::sync::Arc;
use strand_adapter::{shared, Bridge};
use strand_config::LibraryConfig;

/// Where the provider comes from
pub enum Target {
    /// Loaded at runtime from the configured library
    Library(LibraryConfig),
    /// Compiled into this binary
    Linked,
}

impl Target {
    /// Open (or reuse) the process-wide bridge
    pub fn open(&self) -> Result<Arc<Bridge>> {
        match self {
            Target::Library(config) => shared::shared(config)
                .with_context(|| format!("Failed to open provider '{}'", config.name)),
            Target::Linked => Ok(shared::get_or_open(|| Ok(Bridge::linked()))?),
        }
    }
}
