use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BroomError, Result};
use crate::view::SortField;

/// Persistent defaults, overridden by command-line flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry_path: PathBuf,
    pub backup_dir: PathBuf,
    /// Minimum days unavailable before an entity is listed
    pub threshold_days: u32,
    pub default_sort: SortField,
    /// UI poll interval in milliseconds
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("./entity_registry.json"),
            backup_dir: PathBuf::from("./backups"),
            threshold_days: 0,
            default_sort: SortField::DaysUnavailable,
            tick_rate_ms: 50,
        }
    }
}

impl Config {
    /// `<config dir>/broom/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("broom").join("config.toml"))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&text)
            .map_err(|e| BroomError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&temp.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "threshold_days = 14\ndefault_sort = \"name\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.threshold_days, 14);
        assert_eq!(config.default_sort, SortField::Name);
        assert_eq!(config.tick_rate_ms, 50);
    }

    #[test]
    fn test_days_alias() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "default_sort = \"days\"\n").unwrap();
        assert_eq!(
            Config::load(&path).unwrap().default_sort,
            SortField::DaysUnavailable
        );
    }

    #[test]
    fn test_malformed_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "threshold_days = \"many\"").unwrap();
        assert!(matches!(Config::load(&path), Err(BroomError::Config(_))));
    }
}
