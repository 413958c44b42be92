use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_GRID_COLUMNS: u16 = 2;

/// Errors that can occur when loading configuration from disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

/// Persistent console settings.
///
/// Every field is optional on disk; accessors apply the defaults so the rest
/// of the code never branches on `None`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Base URL of the conversation service (e.g. "http://localhost:8000/api").
    pub base_url: Option<String>,
    /// Milliseconds between refresh polls for busy chats.
    pub poll_interval_ms: Option<u64>,
    /// Maximum number of columns in grid view.
    pub grid_columns: Option<u16>,
    /// UI theme name ("dark" or "light").
    pub theme: Option<String>,
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn StdError>> {
        Self::load_from_path(&Self::config_path())
    }

    pub fn load_from_path(config_path: &PathBuf) -> Result<Config, Box<dyn StdError>> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                path: config_path.clone(),
                source,
            })?;
            let config: Config =
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: config_path.clone(),
                    source,
                })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn StdError>> {
        self.save_to_path(&Self::config_path())
    }

    pub(crate) fn save_to_path(&self, config_path: &Path) -> Result<(), Box<dyn StdError>> {
        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(config_path)
            .map_err(|err| -> Box<dyn StdError> { Box::new(err) })?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let proj_dirs = ProjectDirs::from("org", "permacommons", "chatgrid")
            .expect("Failed to determine config directory");
        proj_dirs.config_dir().join("config.toml")
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS)
    }

    pub fn grid_columns(&self) -> u16 {
        self.grid_columns
            .unwrap_or(DEFAULT_GRID_COLUMNS)
            .clamp(1, 3)
    }

    pub fn theme(&self) -> &str {
        self.theme.as_deref().unwrap_or("dark")
    }

    /// Apply a `set` from the command line. Returns an error naming the
    /// accepted keys when the key is unknown or the value does not parse.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<(), Box<dyn StdError>> {
        match key {
            "base-url" => self.base_url = Some(value.to_string()),
            "poll-interval-ms" => {
                let ms: u64 = value
                    .parse()
                    .map_err(|_| format!("poll-interval-ms must be a number, got '{value}'"))?;
                if ms == 0 {
                    return Err("poll-interval-ms must be greater than zero".into());
                }
                self.poll_interval_ms = Some(ms);
            }
            "grid-columns" => {
                let cols: u16 = value
                    .parse()
                    .map_err(|_| format!("grid-columns must be a number, got '{value}'"))?;
                if !(1..=3).contains(&cols) {
                    return Err("grid-columns must be between 1 and 3".into());
                }
                self.grid_columns = Some(cols);
            }
            "theme" => {
                if value != "dark" && value != "light" {
                    return Err(format!("unknown theme '{value}' (expected dark or light)").into());
                }
                self.theme = Some(value.to_string());
            }
            _ => return Err(Self::unknown_key_error(key)),
        }
        Ok(())
    }

    /// Apply an `unset` from the command line, reverting the key to its
    /// default.
    pub fn unset_key(&mut self, key: &str) -> Result<(), Box<dyn StdError>> {
        match key {
            "base-url" => self.base_url = None,
            "poll-interval-ms" => self.poll_interval_ms = None,
            "grid-columns" => self.grid_columns = None,
            "theme" => self.theme = None,
            _ => return Err(Self::unknown_key_error(key)),
        }
        Ok(())
    }

    fn unknown_key_error(key: &str) -> Box<dyn StdError> {
        format!("unknown config key '{key}' (expected base-url, poll-interval-ms, grid-columns, or theme)")
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_apply_when_fields_absent() {
        let config = Config::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.poll_interval_ms(), DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(config.grid_columns(), DEFAULT_GRID_COLUMNS);
        assert_eq!(config.theme(), "dark");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.base_url.is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set_key("base-url", "http://example.test/api").unwrap();
        config.set_key("grid-columns", "3").unwrap();
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.base_url(), "http://example.test/api");
        assert_eq!(loaded.grid_columns(), 3);
    }

    #[test]
    fn invalid_toml_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = [not toml").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn set_key_rejects_unknown_keys_and_bad_values() {
        let mut config = Config::default();
        assert!(config.set_key("color", "blue").is_err());
        assert!(config.set_key("poll-interval-ms", "soon").is_err());
        assert!(config.set_key("poll-interval-ms", "0").is_err());
        assert!(config.set_key("grid-columns", "9").is_err());
        assert!(config.set_key("theme", "mauve").is_err());
    }

    #[test]
    fn unset_key_reverts_to_default() {
        let mut config = Config::default();
        config.set_key("theme", "light").unwrap();
        assert_eq!(config.theme(), "light");
        config.unset_key("theme").unwrap();
        assert_eq!(config.theme(), "dark");
    }

    #[test]
    fn grid_columns_clamped_when_file_has_extreme_value() {
        let config = Config {
            grid_columns: Some(12),
            ..Default::default()
        };
        assert_eq!(config.grid_columns(), 3);
    }
}
