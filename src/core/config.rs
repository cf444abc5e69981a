use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

/// Environment variable that overrides `providers.fxrates.api_key`.
pub const API_KEY_ENV: &str = "FXRATES_API_KEY";

fn default_timeout_secs() -> u64 {
    10
}

fn default_retention_days() -> u32 {
    30
}

/// Upper bound on `retention_days`, roughly a century.
pub const MAX_RETENTION_DAYS: u32 = 36_500;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SwissquoteConfig {
    #[serde(default = "SwissquoteConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SwissquoteConfig {
    fn default_base_url() -> String {
        "https://forex-data-feed.swissquote.com".to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SwissquoteConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FxRatesConfig {
    #[serde(default = "FxRatesConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl FxRatesConfig {
    fn default_base_url() -> String {
        "https://api.fxratesapi.com".to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FxRatesConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub swissquote: SwissquoteConfig,
    #[serde(default)]
    pub fxrates: FxRatesConfig,
}

/// Daily fire time of the scheduler, in UTC.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    #[serde(default = "ScheduleConfig::default_hour")]
    pub hour_utc: u32,
    #[serde(default)]
    pub minute_utc: u32,
}

impl ScheduleConfig {
    fn default_hour() -> u32 {
        6
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            hour_utc: Self::default_hour(),
            minute_utc: 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig::default(),
            schedule: ScheduleConfig::default(),
            retention_days: default_retention_days(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or falls back to defaults when
    /// no config file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Self::default().finish();
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "ratekeeper", "ratekeeper")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "ratekeeper", "ratekeeper")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("store"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        config.finish()
    }

    /// Replaces the configured API key when `key` is set and non-empty.
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            debug!("Using fxrates API key from {}", API_KEY_ENV);
            self.providers.fxrates.api_key = Some(key);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.schedule.hour_utc > 23 || self.schedule.minute_utc > 59 {
            bail!(
                "Invalid schedule time {:02}:{:02} UTC",
                self.schedule.hour_utc,
                self.schedule.minute_utc
            );
        }
        if self.retention_days == 0 {
            bail!("retention_days must be at least 1");
        }
        if self.retention_days > MAX_RETENTION_DAYS {
            bail!("retention_days must be at most {}", MAX_RETENTION_DAYS);
        }
        if self.providers.swissquote.timeout_secs == 0 || self.providers.fxrates.timeout_secs == 0
        {
            bail!("Provider timeouts must be at least one second");
        }
        Ok(())
    }

    fn finish(self) -> Result<Self> {
        let config = self.with_api_key_override(std::env::var(API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_document() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");

        assert_eq!(
            config.providers.swissquote.base_url,
            "https://forex-data-feed.swissquote.com"
        );
        assert_eq!(config.providers.fxrates.base_url, "https://api.fxratesapi.com");
        assert!(config.providers.fxrates.api_key.is_none());
        assert_eq!(config.providers.fxrates.timeout(), Duration::from_secs(10));
        assert_eq!(config.schedule, ScheduleConfig::default());
        assert_eq!(config.schedule.hour_utc, 6);
        assert_eq!(config.retention_days, 30);
        assert!(config.data_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  swissquote:
    base_url: "http://example.com/sq"
    timeout_secs: 5
  fxrates:
    base_url: "http://example.com/fx"
    api_key: "secret"
schedule:
  hour_utc: 4
  minute_utc: 30
retention_days: 7
data_path: "/tmp/ratekeeper"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.providers.swissquote.base_url, "http://example.com/sq");
        assert_eq!(config.providers.swissquote.timeout(), Duration::from_secs(5));
        assert_eq!(config.providers.fxrates.base_url, "http://example.com/fx");
        assert_eq!(config.providers.fxrates.api_key.as_deref(), Some("secret"));
        assert_eq!(config.providers.fxrates.timeout_secs, 10);
        assert_eq!(config.schedule.hour_utc, 4);
        assert_eq!(config.schedule.minute_utc, 30);
        assert_eq!(config.retention_days, 7);
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/ratekeeper")
        );
    }

    #[test]
    fn test_api_key_override() {
        let config = AppConfig::default().with_api_key_override(Some("from-env".to_string()));
        assert_eq!(config.providers.fxrates.api_key.as_deref(), Some("from-env"));

        let config = config.with_api_key_override(Some("  ".to_string()));
        assert_eq!(config.providers.fxrates.api_key.as_deref(), Some("from-env"));

        let config = config.with_api_key_override(None);
        assert_eq!(config.providers.fxrates.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_validate_rejects_bad_schedule() {
        let mut config = AppConfig::default();
        config.schedule.hour_utc = 24;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.retention_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_retention_days() {
        let config: AppConfig = serde_yaml::from_str("retention_days: 4000000000").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at most 36500"));

        let config: AppConfig = serde_yaml::from_str("retention_days: 36500").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yaml");
        fs::write(&path, "retention_days: 14\nschedule:\n  hour_utc: 23\n")?;

        let config = AppConfig::load_from_path(&path)?;
        assert_eq!(config.retention_days, 14);
        assert_eq!(config.schedule.hour_utc, 23);
        assert_eq!(config.schedule.minute_utc, 0);

        fs::write(&path, "schedule:\n  hour_utc: 25\n")?;
        assert!(AppConfig::load_from_path(&path).is_err());
        Ok(())
    }
}
