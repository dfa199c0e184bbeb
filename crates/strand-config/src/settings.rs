//! Effective settings after every source has been applied

use crate::file::{validate_library_name, validate_log_level, ConfigFile};
use crate::ConfigResult;
use serde::Serialize;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DEFAULT_LIBRARY: &str = "strand_provider";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

pub const ENV_LIBRARY: &str = "STRAND_LIBRARY";
pub const ENV_LIBRARY_PATH: &str = "STRAND_LIBRARY_PATH";
pub const ENV_LOG: &str = "STRAND_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct StrandConfig {
    pub library: LibraryConfig,
    pub logging: LoggingConfig,
}

/// Which provider to load and where to look for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryConfig {
    /// Base name, expanded to the platform file name, or a path
    pub name: String,
    /// Searched in order, ahead of the loader's default locations
    pub search_paths: Vec<PathBuf>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_LIBRARY.to_string(),
            search_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Command-line flags, the highest-precedence source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub library: Option<String>,
    /// Searched before every configured path
    pub search_paths: Vec<PathBuf>,
    pub log_level: Option<String>,
}

impl StrandConfig {
    /// Defaults overlaid with an already merged file
    pub fn from_file(file: &ConfigFile) -> Self {
        let mut config = Self::default();
        if let Some(library) = &file.library {
            if let Some(name) = &library.name {
                config.library.name = name.clone();
            }
            if let Some(paths) = &library.search_paths {
                config.library.search_paths = paths.clone();
            }
        }
        if let Some(level) = file.logging.as_ref().and_then(|l| l.level.clone()) {
            config.logging.level = level;
        }
        config
    }

    /// Apply `STRAND_*` variables from the process environment
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_env_with(|key| env::var_os(key))
    }

    /// Apply `STRAND_*` variables read through `lookup`
    ///
    /// `STRAND_LIBRARY_PATH` is a platform path list; its entries are
    /// searched before the configured ones. Empty variables are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(name) = non_empty(ENV_LIBRARY) {
            let name = name.to_string_lossy().into_owned();
            validate_library_name(ENV_LIBRARY, "environment", &name)?;
            self.library.name = name;
        }
        if let Some(paths) = non_empty(ENV_LIBRARY_PATH) {
            let mut search_paths: Vec<PathBuf> = env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            search_paths.append(&mut self.library.search_paths);
            self.library.search_paths = search_paths;
        }
        if let Some(level) = non_empty(ENV_LOG) {
            let level = level.to_string_lossy().into_owned();
            validate_log_level(ENV_LOG, "environment", &level)?;
            self.logging.level = level;
        }
        Ok(())
    }

    /// Apply command-line flags
    pub fn apply_overrides(&mut self, overrides: &Overrides) -> ConfigResult<()> {
        if let Some(name) = &overrides.library {
            validate_library_name("--library", "command line", name)?;
            self.library.name = name.clone();
        }
        if !overrides.search_paths.is_empty() {
            let mut search_paths = overrides.search_paths.clone();
            search_paths.append(&mut self.library.search_paths);
            self.library.search_paths = search_paths;
        }
        if let Some(level) = &overrides.log_level {
            validate_log_level("--log-level", "command line", level)?;
            self.logging.level = level.clone();
        }
        Ok(())
    }
}

/// Whether a library name is a file path rather than a base name
///
/// A separator or an extension makes it a path: `libfoo.so` and
/// `build/provider` are used as given, `strand_provider` is searched for.
pub fn is_library_path(name: &str) -> bool {
    let path = Path::new(name);
    path.components().count() > 1 || path.extension().is_some()
}
