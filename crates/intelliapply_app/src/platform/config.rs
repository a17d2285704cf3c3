//! Application configuration.
//!
//! Values come from an optional RON file, then from `INTELLIAPPLY_*`
//! environment variables, then from command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use intelliapply_engine::{ClientSettings, EngineSettings, StaticToken};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "intelliapply.ron";

const ENV_API_URL: &str = "INTELLIAPPLY_API_URL";
const ENV_ACCESS_TOKEN: &str = "INTELLIAPPLY_ACCESS_TOKEN";
const ENV_LOG: &str = "INTELLIAPPLY_LOG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid value {value:?} for {field}")]
    Invalid { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub access_token: Option<String>,
    pub poll_interval_ms: u64,
    pub message_clear_ms: u64,
    pub progress_cycle_ms: u64,
    pub request_timeout_ms: u64,
    pub reload_timeout_ms: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            access_token: None,
            poll_interval_ms: 3000,
            message_clear_ms: 5000,
            progress_cycle_ms: 2000,
            request_timeout_ms: 30_000,
            reload_timeout_ms: 5000,
            log_destination: LogDestination::File,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `explicit`, or `./intelliapply.ron` when no path is given.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup(ENV_API_URL).filter(|url| !url.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
        if let Some(destination) = lookup(ENV_LOG) {
            self.log_destination =
                LogDestination::from_name(&destination).ok_or(ConfigError::Invalid {
                    field: ENV_LOG,
                    value: destination,
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level_filter()?;
        let intervals = [
            ("poll_interval_ms", self.poll_interval_ms),
            ("progress_cycle_ms", self.progress_cycle_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("reload_timeout_ms", self.reload_timeout_ms),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter, ConfigError> {
        intelliapply_logging::level_from_name(&self.log_level).ok_or_else(|| {
            ConfigError::Invalid {
                field: "log_level",
                value: self.log_level.clone(),
            }
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token_provider().is_present()
    }

    pub fn token_provider(&self) -> StaticToken {
        StaticToken::new(self.access_token.clone())
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_url.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..ClientSettings::default()
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            message_clear_delay: Duration::from_millis(self.message_clear_ms),
            progress_cycle_interval: Duration::from_millis(self.progress_cycle_ms),
            reload_timeout: Duration::from_millis(self.reload_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"(api_url: "https://api.example.com", poll_interval_ms: 1500, log_destination: Both)"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.poll_interval_ms, 1500);
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.message_clear_ms, 5000);
        assert_eq!(config.reload_timeout_ms, 5000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(api_url: 42").unwrap();
        assert!(matches!(
            AppConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.ron");
        assert!(matches!(
            AppConfig::from_file(&missing),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                (ENV_API_URL, "http://backend:9000"),
                (ENV_ACCESS_TOKEN, "jwt-abc"),
                (ENV_LOG, "terminal"),
            ]))
            .unwrap();
        assert_eq!(config.api_url, "http://backend:9000");
        assert!(config.is_authenticated());
        assert_eq!(config.log_destination, LogDestination::Terminal);
    }

    #[test]
    fn unknown_log_destination_is_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[(ENV_LOG, "syslog")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: ENV_LOG, .. }));
    }

    #[test]
    fn blank_token_is_unauthenticated() {
        let config = AppConfig {
            access_token: Some("   ".to_string()),
            ..AppConfig::default()
        };
        assert!(!config.is_authenticated());
    }

    #[test]
    fn validation_rejects_bad_level_and_zero_interval() {
        let bad_level = AppConfig {
            log_level: "loud".to_string(),
            ..AppConfig::default()
        };
        assert!(bad_level.validate().is_err());

        let zero_poll = AppConfig {
            poll_interval_ms: 0,
            ..AppConfig::default()
        };
        assert!(matches!(
            zero_poll.validate(),
            Err(ConfigError::Invalid {
                field: "poll_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn settings_carry_configured_durations() {
        let config = AppConfig {
            poll_interval_ms: 250,
            reload_timeout_ms: 1000,
            ..AppConfig::default()
        };
        let engine = config.engine_settings();
        assert_eq!(engine.poll_interval, Duration::from_millis(250));
        assert_eq!(engine.reload_timeout, Duration::from_secs(1));
        assert_eq!(config.client_settings().base_url, "http://localhost:8000");
    }
}
