//! Strand Configuration System
//!
//! Decides which provider library the adapter loads, where it looks for it,
//! and how loudly the tools log:
//! - Project configuration (strand.toml)
//! - Global user configuration (~/.strand/config.toml)
//! - Environment overrides (STRAND_*)
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Built-in defaults
//! 2. Global config (~/.strand/config.toml)
//! 3. Project config (./strand.toml, searched upwards)
//! 4. Environment variables (`STRAND_LIBRARY`, `STRAND_LIBRARY_PATH`, `STRAND_LOG`)
//! 5. CLI flags ([`Overrides`])
//!
//! # Example
//!
//! ```no_run
//! use strand_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let loaded = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("provider: {}", loaded.config.library.name);
//! ```

pub mod file;
pub mod loader;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file {file}: {source}")]
    IoError {
        file: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid TOML in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}' in {origin}: {reason}")]
    InvalidValue {
        field: String,
        origin: String,
        reason: String,
    },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use file::ConfigFile;
pub use loader::{ConfigLoader, LoadedConfig};
pub use settings::{is_library_path, LibraryConfig, LoggingConfig, Overrides, StrandConfig};
