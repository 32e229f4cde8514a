//! Configuration management for sspm.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults. Values
//! can also be read and changed one at a time through dotted keys such as
//! `projects.location`, which is how `sspm config get/set` works.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sspm.toml";

/// Configuration directory name.
const CONFIG_DIR_NAME: &str = "sspm";

/// Default registry file name, relative to the projects location.
const DATABASE_FILE_NAME: &str = "sspm.db";

/// Prefix of environment variables overriding file values.
const ENV_PREFIX: &str = "SSPM_";

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "projects.location",
    "projects.create_folders",
    "storage.database_path",
    "tools.git_path",
    "tools.use_git",
    "tools.git_ignore_data",
];

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SSPM_`, sections split by `__`)
/// 2. TOML config file at `~/.config/sspm/sspm.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Projects root configuration.
    pub projects: ProjectsConfig,
    /// Registry storage configuration.
    pub storage: StorageConfig,
    /// External tools configuration.
    pub tools: ToolsConfig,
}

/// Projects root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectsConfig {
    /// Folder holding the registry file and all project folders.
    pub location: Option<PathBuf>,
    /// Create the folder skeleton when a project is created.
    pub create_folders: bool,
}

/// Registry storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the registry database.
    /// Defaults to `<projects.location>/sspm.db`
    pub database_path: Option<PathBuf>,
}

/// External tools configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Explicit path to the git executable. Looked up on `PATH` when unset.
    pub git_path: Option<PathBuf>,
    /// Initialize a git repository in new project folders.
    pub use_git: bool,
    /// Keep the `data/` folder out of version control.
    pub git_ignore_data: bool,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            location: None,
            create_folders: true,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git_path: None,
            use_git: true,
            git_ignore_data: true,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Self::file_figment(&config_file).merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load only the defaults and the TOML file, ignoring the environment.
    ///
    /// This is the view that gets edited and written back by [`Config::save_to`],
    /// so environment overrides never leak into the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_file(config_file: &Path) -> Result<Self> {
        Ok(Self::file_figment(config_file).extract()?)
    }

    fn file_figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
    }

    /// Write this configuration to the given TOML file.
    ///
    /// Creates the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be serialized or written.
    pub fn save_to(&self, config_file: &Path) -> Result<()> {
        if let Some(parent) = config_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let contents = toml::to_string_pretty(self).map_err(|e| Error::ConfigWrite {
            path: config_file.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(config_file, contents).map_err(|e| Error::ConfigWrite {
            path: config_file.to_path_buf(),
            message: e.to_string(),
        })?;

        info!("Wrote configuration to {}", config_file.display());
        Ok(())
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(location) = &self.projects.location {
            if location.exists() && !location.is_dir() {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "projects.location ({}) is not a directory",
                        location.display()
                    ),
                });
            }
        }

        if let Some(database) = &self.storage.database_path {
            if database.is_dir() {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "storage.database_path ({}) is a directory",
                        database.display()
                    ),
                });
            }
        }

        Ok(())
    }

    /// Get the projects location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConfigured`] if `projects.location` is unset.
    pub fn projects_location(&self) -> Result<&Path> {
        match &self.projects.location {
            Some(location) if !location.as_os_str().is_empty() => Ok(location),
            _ => Err(Error::NotConfigured),
        }
    }

    /// Get the registry database path, resolving defaults if not set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConfigured`] if neither `storage.database_path`
    /// nor `projects.location` is set.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage.database_path {
            return Ok(path.clone());
        }
        Ok(self.projects_location()?.join(DATABASE_FILE_NAME))
    }

    /// Read a single value by dotted key.
    ///
    /// Unset paths are returned as an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigKey`] for unknown keys.
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "projects.location" => path_to_string(self.projects.location.as_deref()),
            "projects.create_folders" => self.projects.create_folders.to_string(),
            "storage.database_path" => path_to_string(self.storage.database_path.as_deref()),
            "tools.git_path" => path_to_string(self.tools.git_path.as_deref()),
            "tools.use_git" => self.tools.use_git.to_string(),
            "tools.git_ignore_data" => self.tools.git_ignore_data.to_string(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Change a single value by dotted key.
    ///
    /// An empty value clears optional paths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigKey`] for unknown keys and
    /// [`Error::ConfigValidation`] for values that do not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "projects.location" => self.projects.location = string_to_path(value),
            "projects.create_folders" => self.projects.create_folders = parse_bool(key, value)?,
            "storage.database_path" => self.storage.database_path = string_to_path(value),
            "tools.git_path" => self.tools.git_path = string_to_path(value),
            "tools.use_git" => self.tools.use_git = parse_bool(key, value)?,
            "tools.git_ignore_data" => self.tools.git_ignore_data = parse_bool(key, value)?,
            _ => return Err(unknown_key(key)),
        }
        debug!("Set configuration {} = {:?}", key, value);
        Ok(())
    }

    /// All keys with their current values, in [`CONFIG_KEYS`] order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        CONFIG_KEYS
            .iter()
            .filter_map(|key| self.get(key).ok().map(|value| (*key, value)))
            .collect()
    }
}

fn unknown_key(key: &str) -> Error {
    Error::ConfigKey {
        key: key.to_string(),
        valid: CONFIG_KEYS.to_vec(),
    }
}

fn path_to_string(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

fn string_to_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(Error::ConfigValidation {
            message: format!("{key} expects true or false, got '{value}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.projects.location.is_none());
        assert!(config.projects.create_folders);
        assert!(config.storage.database_path.is_none());
        assert!(config.tools.git_path.is_none());
        assert!(config.tools.use_git);
        assert!(config.tools.git_ignore_data);
        assert!(matches!(config.projects_location(), Err(Error::NotConfigured)));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_location_is_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.projects.location = Some(file.path().to_path_buf());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("projects.location"));
    }

    #[test]
    fn test_validate_database_is_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database_path = Some(dir.path().to_path_buf());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("storage.database_path"));
    }

    #[test]
    fn test_projects_location_not_configured() {
        let config = Config::default();
        assert!(matches!(
            config.projects_location(),
            Err(Error::NotConfigured)
        ));
        assert!(matches!(config.database_path(), Err(Error::NotConfigured)));
    }

    #[test]
    fn test_database_path_default() {
        let mut config = Config::default();
        config.projects.location = Some(PathBuf::from("/data/projects"));

        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/data/projects/sspm.db")
        );
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/registry.db"));

        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/custom/registry.db")
        );
    }

    #[test]
    fn test_get_and_set() {
        let mut config = Config::default();
        assert_eq!(config.get("projects.location").unwrap(), "");

        config.set("projects.location", "/Users/aaron/Project").unwrap();
        assert_eq!(
            config.get("projects.location").unwrap(),
            "/Users/aaron/Project"
        );

        config.set("tools.use_git", "False").unwrap();
        assert_eq!(config.get("tools.use_git").unwrap(), "false");
        assert!(!config.tools.use_git);

        config.set("projects.location", "").unwrap();
        assert!(config.projects.location.is_none());
    }

    #[test]
    fn test_set_invalid_bool() {
        let mut config = Config::default();
        let err = config.set("tools.use_git", "maybe").unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_unknown_key() {
        let mut config = Config::default();
        assert!(matches!(
            config.get("projects.nope"),
            Err(Error::ConfigKey { .. })
        ));
        assert!(matches!(
            config.set("nope", "1"),
            Err(Error::ConfigKey { .. })
        ));
    }

    #[test]
    fn test_entries_cover_all_keys() {
        let entries = Config::default().entries();
        assert_eq!(entries.len(), CONFIG_KEYS.len());
        assert_eq!(entries[0].0, "projects.location");
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("sspm"));
        assert!(path.to_string_lossy().ends_with("sspm.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_file(Path::new("/nonexistent/sspm.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("sspm.toml");

        let mut config = Config::default();
        config.set("projects.location", "/srv/projects").unwrap();
        config.set("tools.git_ignore_data", "no").unwrap();
        config.save_to(&file).unwrap();

        let reloaded = Config::load_file(&file).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_config_serialize_skips_unset_paths() {
        let toml = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(toml.contains("use_git"));
        assert!(!toml.contains("location"));
    }
}
