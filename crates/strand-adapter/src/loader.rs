//! Provider library discovery and loading
//!
//! Resolves a base name such as `strand_provider` to the platform file name
//! (`libstrand_provider.so`, `libstrand_provider.dylib`, `strand_provider.dll`)
//! across an ordered list of search paths, and loads each file at most once.

use libloading::Library;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strand_config::is_library_path;

/// Library loading errors
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// No candidate file exists in any search path
    LibraryNotFound { name: String, searched: Vec<PathBuf> },
    /// A required symbol is missing from the library
    SymbolNotFound { library: String, symbol: String },
    /// The file exists but the platform loader rejected it
    LoadFailed { path: PathBuf, message: String },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::LibraryNotFound { name, searched } => {
                write!(f, "Library not found: {} (searched {} paths", name, searched.len())?;
                if let Some(first) = searched.first() {
                    write!(f, ", starting at {}", first.display())?;
                }
                write!(f, ")")
            }
            LoadError::SymbolNotFound { library, symbol } => {
                write!(f, "Symbol '{}' not found in library '{}'", symbol, library)
            }
            LoadError::LoadFailed { path, message } => {
                write!(f, "Failed to load {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Platform file names for a library base name, in priority order
pub fn file_names(name: &str) -> Vec<String> {
    let extensions: &[&str] = if cfg!(target_os = "windows") {
        &["dll"]
    } else if cfg!(target_os = "macos") {
        &["dylib", "so"]
    } else {
        &["so"]
    };

    // Unix prefers the "lib" prefix, Windows rarely uses it
    let prefixes: &[&str] = if cfg!(target_os = "windows") {
        &["", "lib"]
    } else {
        &["lib", ""]
    };

    prefixes
        .iter()
        .flat_map(|prefix| {
            extensions
                .iter()
                .map(move |ext| format!("{}{}.{}", prefix, name, ext))
        })
        .collect()
}

/// Dynamic library loader with caching and platform-specific path resolution
///
/// # Safety
///
/// Loading a library runs its initialization code in this process. Only load
/// providers you trust.
pub struct LibraryLoader {
    loaded: HashMap<PathBuf, Arc<Library>>,
    search_paths: Vec<PathBuf>,
}

impl LibraryLoader {
    /// Create a loader with the default search paths
    pub fn new() -> Self {
        Self {
            loaded: HashMap::new(),
            search_paths: Self::default_search_paths(),
        }
    }

    /// Create a loader that tries `paths` first, then the defaults
    pub fn with_search_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut search_paths: Vec<PathBuf> = paths.into_iter().collect();
        search_paths.extend(Self::default_search_paths());
        Self {
            loaded: HashMap::new(),
            search_paths,
        }
    }

    /// Default search paths, highest priority first
    ///
    /// - the current working directory
    /// - the running executable's directory and its parent (covers
    ///   `target/<profile>` for binaries and `target/<profile>/deps` for tests)
    /// - the platform's system library directories
    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            if let Some(parent) = exe_dir.parent() {
                paths.push(exe_dir.clone());
                paths.push(parent.to_path_buf());
            } else {
                paths.push(exe_dir);
            }
        }

        #[cfg(target_os = "linux")]
        {
            paths.push(PathBuf::from("/usr/lib"));
            paths.push(PathBuf::from("/usr/local/lib"));
            paths.push(PathBuf::from("/lib"));

            if cfg!(target_pointer_width = "64") {
                paths.push(PathBuf::from("/usr/lib64"));
                paths.push(PathBuf::from("/lib64"));
            }
        }

        #[cfg(target_os = "macos")]
        {
            paths.push(PathBuf::from("/usr/lib"));
            paths.push(PathBuf::from("/usr/local/lib"));
            paths.push(PathBuf::from("/opt/homebrew/lib"));
        }

        #[cfg(target_os = "windows")]
        {
            if let Ok(system_root) = std::env::var("SystemRoot") {
                paths.push(PathBuf::from(format!("{}\\System32", system_root)));
            }
        }

        paths
    }

    /// Resolve a base name or an explicit path to an existing file
    ///
    /// Anything that looks like a path (a separator or an extension) is used
    /// as given; otherwise every search path is tried with every platform
    /// file name.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if is_library_path(name) {
            let path = Path::new(name);
            return path.is_file().then(|| path.to_path_buf());
        }

        let candidates = file_names(name);
        self.search_paths
            .iter()
            .flat_map(|dir| candidates.iter().map(move |file| dir.join(file)))
            .find(|candidate| candidate.is_file())
    }

    /// Load a library by base name or path, reusing an earlier load
    pub fn load(&mut self, name: &str) -> Result<Arc<Library>, LoadError> {
        let path = self
            .resolve(name)
            .ok_or_else(|| LoadError::LibraryNotFound {
                name: name.to_string(),
                searched: self.search_paths.clone(),
            })?;

        if let Some(library) = self.loaded.get(&path) {
            tracing::debug!(path = %path.display(), "provider already loaded");
            return Ok(Arc::clone(library));
        }

        let library = unsafe { Library::new(&path) }.map_err(|e| LoadError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "provider loaded");

        let library = Arc::new(library);
        self.loaded.insert(path, Arc::clone(&library));
        Ok(library)
    }

    /// Path a base name resolves to, as last loaded
    pub fn loaded_path(&self, name: &str) -> Option<PathBuf> {
        self.resolve(name).filter(|path| self.loaded.contains_key(path))
    }

    /// Add a search path with the highest priority
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.insert(0, path);
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let names = file_names("strand_provider");
        if cfg!(target_os = "windows") {
            assert_eq!(names[0], "strand_provider.dll");
        } else if cfg!(target_os = "macos") {
            assert_eq!(names[0], "libstrand_provider.dylib");
        } else {
            assert_eq!(names, ["libstrand_provider.so", "strand_provider.so"]);
        }
    }

    #[test]
    fn test_default_search_paths_start_at_cwd() {
        let paths = LibraryLoader::default_search_paths();
        assert!(!paths.is_empty());
        if let Ok(cwd) = std::env::current_dir() {
            assert_eq!(paths[0], cwd);
        }
    }

    #[test]
    fn test_configured_paths_come_first() {
        let custom = PathBuf::from("/custom/providers");
        let loader = LibraryLoader::with_search_paths([custom.clone()]);
        assert_eq!(loader.search_paths()[0], custom);
        assert!(loader.search_paths().len() > 1);
    }

    #[test]
    fn test_add_search_path_has_priority() {
        let mut loader = LibraryLoader::new();
        loader.add_search_path(PathBuf::from("/first"));
        assert_eq!(loader.search_paths()[0], PathBuf::from("/first"));
    }

    #[test]
    fn test_library_not_found() {
        let mut loader = LibraryLoader::new();
        let result = loader.load("nonexistent_provider_xyz");
        assert!(matches!(
            result,
            Err(LoadError::LibraryNotFound { ref name, .. }) if name == "nonexistent_provider_xyz"
        ));
        assert_eq!(loader.loaded_count(), 0);
    }

    #[test]
    fn test_explicit_missing_path_is_not_searched() {
        let loader = LibraryLoader::new();
        assert_eq!(loader.resolve("/definitely/not/here/libx.so"), None);
        assert_eq!(loader.resolve("libx.so"), None);
    }

    #[test]
    fn test_file_name_is_used_as_given() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("libfoo.so");
        std::fs::write(&file, b"").unwrap();

        let loader = LibraryLoader::with_search_paths([dir.path().to_path_buf()]);
        assert_eq!(loader.resolve("libfoo.so"), None);
        assert_eq!(loader.resolve(&file.display().to_string()), Some(file));
    }

    #[test]
    fn test_load_failed_for_non_library_file() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join(&file_names("bogus_provider")[0]);
        std::fs::write(&bogus, b"not a shared object").unwrap();

        let mut loader = LibraryLoader::with_search_paths([dir.path().to_path_buf()]);
        assert_eq!(loader.resolve("bogus_provider"), Some(bogus));
        let result = loader.load("bogus_provider");
        assert!(matches!(result, Err(LoadError::LoadFailed { .. })));
    }
}
