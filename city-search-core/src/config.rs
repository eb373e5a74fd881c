use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_BASE_URL: &str = "https://wft-geo-db.p.rapidapi.com/v1/geo";
pub const DEFAULT_API_HOST: &str = "wft-geo-db.p.rapidapi.com";
pub const DEFAULT_MIN_POPULATION: u64 = 1_000_000;

/// Everything the option loader needs to reach the city-lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_host: String,
    pub min_population: u64,
}

impl GeoApiConfig {
    /// Defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            api_host: DEFAULT_API_HOST.to_string(),
            min_population: DEFAULT_MIN_POPULATION,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// base_url = "https://wft-geo-db.p.rapidapi.com/v1/geo"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub api_host: Option<String>,
    pub min_population: Option<u64>,
}

impl Config {
    /// Resolve the loader configuration, filling in defaults.
    pub fn geo_api_config(&self) -> Result<GeoApiConfig> {
        let api_key = self.api_key.as_deref().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured for the city-lookup service.\n\
                 Hint: run `city-search configure` and enter your API key."
            )
        })?;

        Ok(GeoApiConfig {
            base_url: self.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: api_key.to_string(),
            api_host: self.api_host.clone().unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            min_population: self.min_population.unwrap_or(DEFAULT_MIN_POPULATION),
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn is_configured(&self) -> bool {
        self.geo_api_config().is_ok()
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "city-search", "city-search")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_api_config_errors_without_key() {
        let err = Config::default().geo_api_config().unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `city-search configure`"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let cfg = Config { api_key: Some("  ".into()), ..Config::default() };
        assert!(!cfg.is_configured());
    }

    #[test]
    fn geo_api_config_fills_defaults() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());

        let api = cfg.geo_api_config().expect("key is set");
        assert_eq!(api, GeoApiConfig::new("KEY"));
        assert_eq!(api.min_population, 1_000_000);
        assert_eq!(api.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn overrides_take_precedence() {
        let cfg = Config {
            api_key: Some("KEY".into()),
            base_url: Some("http://localhost:9000".into()),
            api_host: Some("localhost".into()),
            min_population: Some(5),
        };

        let api = cfg.geo_api_config().expect("key is set");
        assert_eq!(api.base_url, "http://localhost:9000");
        assert_eq!(api.api_host, "localhost");
        assert_eq!(api.min_population, 5);
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("load");
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("SECRET".into());
        cfg.min_population = Some(250_000);
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.api_key.as_deref(), Some("SECRET"));
        assert_eq!(loaded.min_population, Some(250_000));
        assert!(loaded.base_url.is_none());
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").expect("write");

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
