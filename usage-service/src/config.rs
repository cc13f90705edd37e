use std::{
    collections::BTreeMap,
    fs,
    io,
    path::{Path, PathBuf},
};

use energy_client::{aggregate::DEFAULT_RECENT_LIMIT, Catalog};
use serde::Deserialize;

pub const CONFIG_ENV: &str = "ENERGY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "energy-config.toml";
pub const DEFAULT_DATA_FILE: &str = "clean_energy_data.csv";

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Usage store (CSV).
    pub data_file: PathBuf,
    /// Rows shown in the dashboard's recent-logs table.
    pub recent_limit: usize,
    /// Replaces the built-in appliance set when present.
    pub catalog: Option<BTreeMap<String, f64>>,
    pub metrics: Option<MetricsConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            recent_limit: DEFAULT_RECENT_LIMIT,
            catalog: None,
            metrics: None,
        }
    }
}

impl AppConfig {
    /// Load from `$ENERGY_CONFIG` (or `energy-config.toml`), falling back to
    /// defaults when the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(anyhow::anyhow!("failed to read config {}: {e}", path.display()));
            }
        };

        let cfg: AppConfig = toml::from_str(&contents)?;
        // Surface a bad catalog at startup rather than on first use.
        cfg.catalog()?;
        Ok(cfg)
    }

    pub fn catalog(&self) -> anyhow::Result<Catalog> {
        match &self.catalog {
            Some(entries) => Ok(Catalog::new(entries.clone())?),
            None => Ok(Catalog::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("energy-config-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!("absent-{}.toml", uuid::Uuid::new_v4()));
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.data_file, PathBuf::from(DEFAULT_DATA_FILE));
        assert_eq!(cfg.recent_limit, 10);
        assert!(cfg.metrics.is_none());
        assert_eq!(cfg.catalog().unwrap(), Catalog::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = write_config(
            r#"
            data_file = "/var/lib/energy/usage.csv"

            [catalog]
            Lights = 0.08
            Television = 0.1

            [metrics]
            bind_addr = "127.0.0.1:9100"
            "#,
        );

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.data_file, PathBuf::from("/var/lib/energy/usage.csv"));
        assert_eq!(cfg.recent_limit, 10);
        assert_eq!(cfg.metrics.unwrap().bind_addr, "127.0.0.1:9100");

        let catalog = cfg.catalog.as_ref().map(|c| c.len());
        assert_eq!(catalog, Some(2));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn rejects_non_positive_rating() {
        let path = write_config("[catalog]\nHeater = -2.0\n");
        assert!(AppConfig::load_from(&path).is_err());
        fs::remove_file(path).unwrap();
    }
}
