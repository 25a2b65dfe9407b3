use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use campus_planner_core::SortKey;
use campus_planner_store::{DEFAULT_SETTINGS_KEY, DEFAULT_TASKS_KEY, StorageKeys, check_key};
use serde::Deserialize;

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_EXPORT_PREFIX: &str = "campus-tasks";

/// Top-level configuration loaded from `<data-dir>/config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl ProjectConfig {
    /// Load configuration from a data directory. A missing file yields defaults.
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self> {
        let config_path = data_dir.as_ref().join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        if self.export.prefix.trim().is_empty() {
            bail!("export prefix must not be empty");
        }
        if SortKey::parse(&self.display.default_sort).is_none() {
            let allowed = SortKey::ALL.map(SortKey::as_str).join(", ");
            bail!("unknown default sort '{}'. Allowed values: {allowed}.", self.display.default_sort);
        }
        Ok(())
    }
}

/// Names of the persisted entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub tasks_key: String,
    pub settings_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tasks_key: DEFAULT_TASKS_KEY.into(),
            settings_key: DEFAULT_SETTINGS_KEY.into(),
        }
    }
}

impl StorageConfig {
    /// Entry names for the persistence adapter.
    pub fn keys(&self) -> StorageKeys {
        StorageKeys {
            tasks: self.tasks_key.clone(),
            settings: self.settings_key.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        for key in [&self.tasks_key, &self.settings_key] {
            if let Err(reason) = check_key(key) {
                bail!("invalid storage key '{key}': {reason}");
            }
        }
        if self.tasks_key == self.settings_key {
            bail!("storage keys must be distinct, both are '{}'", self.tasks_key);
        }
        Ok(())
    }
}

/// Export artifact naming.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_EXPORT_PREFIX.into(),
        }
    }
}

/// Listing defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub default_sort: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_sort: SortKey::default().as_str().into(),
        }
    }
}

impl DisplayConfig {
    /// Sort order used when none is requested.
    pub fn sort_key(&self) -> SortKey {
        SortKey::from_name(Some(&self.default_sort))
    }
}
