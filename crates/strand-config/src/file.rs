//! Configuration files (strand.toml and ~/.strand/config.toml)
//!
//! Both files share one schema. Every field is optional so that a file only
//! overrides what it names.

use crate::settings::is_library_path;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of one configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Provider library selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<LibrarySection>,

    /// Log output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LibrarySection {
    /// Base name (`strand_provider`) or explicit path to the shared library
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Directories searched before the default locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_paths: Option<Vec<PathBuf>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// One of trace, debug, info, warn, error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl ConfigFile {
    /// Load and validate a configuration file
    ///
    /// Relative search paths are resolved against the directory holding the
    /// file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError {
                    file: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let mut config = Self::parse(&content, path)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }
        tracing::debug!(file = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Parse and validate `content`; `path` is only used in error messages
    pub fn parse(content: &str, path: &Path) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;
        config.validate(&path.display().to_string())?;
        Ok(config)
    }

    pub fn validate(&self, origin: &str) -> ConfigResult<()> {
        if let Some(name) = self.library.as_ref().and_then(|l| l.name.as_deref()) {
            validate_library_name("library.name", origin, name)?;
        }
        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            validate_log_level("logging.level", origin, level)?;
        }
        Ok(())
    }

    /// Overlay `other` onto this file; fields set in `other` win
    pub fn merge(&mut self, other: &ConfigFile) {
        if let Some(theirs) = &other.library {
            let ours = self.library.get_or_insert_with(Default::default);
            if theirs.name.is_some() {
                ours.name = theirs.name.clone();
            }
            if theirs.search_paths.is_some() {
                ours.search_paths = theirs.search_paths.clone();
            }
        }
        if let Some(theirs) = &other.logging {
            let ours = self.logging.get_or_insert_with(Default::default);
            if theirs.level.is_some() {
                ours.level = theirs.level.clone();
            }
        }
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        let Some(library) = self.library.as_mut() else {
            return;
        };
        if let Some(paths) = library.search_paths.as_mut() {
            for path in paths.iter_mut().filter(|p| p.is_relative()) {
                *path = base.join(&*path);
            }
        }
        if let Some(name) = library.name.as_mut() {
            let as_path = Path::new(name.as_str());
            if as_path.is_relative() && is_library_path(name.as_str()) {
                *name = base.join(as_path).display().to_string();
            }
        }
    }
}

pub(crate) fn validate_library_name(field: &str, origin: &str, name: &str) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            origin: origin.to_string(),
            reason: "library name must not be empty".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn validate_log_level(field: &str, origin: &str, level: &str) -> ConfigResult<()> {
    if !is_valid_level(level) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            origin: origin.to_string(),
            reason: format!(
                "must be one of trace, debug, info, warn, error, got '{}'",
                level
            ),
        });
    }
    Ok(())
}

fn is_valid_level(level: &str) -> bool {
    matches!(
        level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(toml: &str) -> ConfigResult<ConfigFile> {
        ConfigFile::parse(toml, Path::new("strand.toml"))
    }

    #[test]
    fn test_parse_full_file() {
        let config = parse(
            r#"
[library]
name = "strand_provider"
search_paths = ["/opt/strand/lib"]

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let library = config.library.unwrap();
        assert_eq!(library.name.as_deref(), Some("strand_provider"));
        assert_eq!(
            library.search_paths,
            Some(vec![PathBuf::from("/opt/strand/lib")])
        );
        assert_eq!(config.logging.unwrap().level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_parse_empty_file() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = parse("[library]\nflavour = \"vanilla\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseError { .. }));
        assert!(err.to_string().contains("strand.toml"));
    }

    #[test]
    fn test_empty_library_name_rejected() {
        let err = parse("[library]\nname = \"  \"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "library.name"
        ));
    }

    #[rstest]
    #[case("trace", true)]
    #[case("INFO", true)]
    #[case("warn", true)]
    #[case("verbose", false)]
    #[case("", false)]
    fn test_log_level_validation(#[case] level: &str, #[case] valid: bool) {
        let toml = format!("[logging]\nlevel = \"{}\"\n", level);
        assert_eq!(parse(&toml).is_ok(), valid);
    }

    #[test]
    fn test_merge_overrides_only_set_fields() {
        let mut base = parse(
            r#"
[library]
name = "global_provider"
search_paths = ["/usr/lib/strand"]

[logging]
level = "info"
"#,
        )
        .unwrap();
        let overlay = parse("[library]\nname = \"project_provider\"\n").unwrap();

        base.merge(&overlay);

        let library = base.library.as_ref().unwrap();
        assert_eq!(library.name.as_deref(), Some("project_provider"));
        assert_eq!(
            library.search_paths,
            Some(vec![PathBuf::from("/usr/lib/strand")])
        );
        assert_eq!(base.logging.unwrap().level.as_deref(), Some("info"));
    }

    #[test]
    fn test_relative_paths_resolve_against_file_dir() {
        let mut config = parse(
            r#"
[library]
name = "build/libstrand_provider.so"
search_paths = ["target/debug", "/abs"]
"#,
        )
        .unwrap();
        config.resolve_relative_paths(Path::new("/work/project"));

        let library = config.library.unwrap();
        assert_eq!(
            library.name.as_deref(),
            Some("/work/project/build/libstrand_provider.so")
        );
        assert_eq!(
            library.search_paths.unwrap(),
            vec![
                PathBuf::from("/work/project/target/debug"),
                PathBuf::from("/abs")
            ]
        );
    }

    #[test]
    fn test_bare_file_name_is_resolved() {
        let mut config = parse("[library]\nname = \"libfoo.so\"\n").unwrap();
        config.resolve_relative_paths(Path::new("/work/project"));
        assert_eq!(
            config.library.unwrap().name.as_deref(),
            Some("/work/project/libfoo.so")
        );
    }

    #[test]
    fn test_base_name_is_not_resolved() {
        let mut config = parse("[library]\nname = \"strand_provider\"\n").unwrap();
        config.resolve_relative_paths(Path::new("/work/project"));
        assert_eq!(
            config.library.unwrap().name.as_deref(),
            Some("strand_provider")
        );
    }
}
