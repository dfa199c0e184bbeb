//! Configuration Loader
//!
//! Finds and merges configuration files, then applies environment overrides.
//! CLI flags are applied by the caller through
//! [`StrandConfig::apply_overrides`](crate::StrandConfig::apply_overrides).

use crate::file::ConfigFile;
use crate::settings::StrandConfig;
use crate::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

pub const PROJECT_FILE: &str = "strand.toml";

/// Configuration loader
///
/// Precedence, lowest first:
/// 1. Defaults
/// 2. Global config (~/.strand/config.toml)
/// 3. Project config (strand.toml)
/// 4. Environment variables (STRAND_*)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: StrandConfig,

    /// Directory where strand.toml was found
    pub project_root: Option<PathBuf>,

    /// Files that contributed, lowest precedence first
    pub sources: Vec<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use `path` as the global configuration file instead of the one in
    /// the home directory
    pub fn with_global_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find strand.toml; a missing project
    /// or global file is not an error.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<LoadedConfig> {
        let project = find_project_file(start_dir);
        self.load(project)
    }

    /// Load configuration from a specific project file, which must exist
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<LoadedConfig> {
        if !config_path.is_file() {
            return Err(ConfigError::NotFound(config_path.to_path_buf()));
        }
        self.load(Some(config_path.to_path_buf()))
    }

    fn load(&mut self, project_file: Option<PathBuf>) -> ConfigResult<LoadedConfig> {
        let mut merged = ConfigFile::default();
        let mut sources = Vec::new();

        if let Some(global_path) = self.global_path() {
            if global_path.is_file() {
                merged.merge(&ConfigFile::load_from_file(&global_path)?);
                sources.push(global_path);
            }
        }

        let mut project_root = None;
        if let Some(project_file) = project_file {
            merged.merge(&ConfigFile::load_from_file(&project_file)?);
            project_root = project_file.parent().map(Path::to_path_buf);
            sources.push(project_file);
        }

        let mut config = StrandConfig::from_file(&merged);
        config.apply_env()?;

        tracing::debug!(
            library = %config.library.name,
            sources = sources.len(),
            "configuration resolved"
        );
        Ok(LoadedConfig {
            config,
            project_root,
            sources,
        })
    }

    fn global_path(&mut self) -> Option<PathBuf> {
        if self.global_config_path.is_none() {
            match Self::global_config_dir() {
                Ok(dir) => self.global_config_path = Some(dir.join("config.toml")),
                Err(e) => tracing::debug!("skipping global configuration: {}", e),
            }
        }
        self.global_config_path.clone()
    }

    /// Get the global configuration directory (~/.strand)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".strand"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadedConfig {
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}

fn find_project_file(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(PROJECT_FILE))
        .find(|candidate| candidate.is_file())
}
