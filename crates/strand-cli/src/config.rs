//! Configuration for one CLI invocation
//!
//! Files and `STRAND_*` variables come from `strand-config`; flags are
//! applied last.

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use strand_config::{ConfigLoader, LoadedConfig, Overrides};

/// Translate global flags into config overrides
///
/// `-v` raises the log level to debug and `-vv` to trace; without it the
/// configured level stands.
pub fn overrides(library: Option<String>, search_paths: Vec<PathBuf>, verbose: u8) -> Overrides {
    let log_level = match verbose {
        0 => None,
        1 => Some("debug".to_string()),
        _ => Some("trace".to_string()),
    };
    Overrides {
        library,
        search_paths,
        log_level,
    }
}

/// Load files and environment, then apply `overrides`
pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<LoadedConfig> {
    let mut loader = ConfigLoader::new();
    let mut loaded = match config_file {
        Some(path) => loader.load_from_file(path)?,
        None => {
            let cwd = env::current_dir().context("Failed to read the working directory")?;
            loader.load_from_directory(&cwd)?
        }
    };
    loaded.config.apply_overrides(overrides)?;
    Ok(loaded)
}
