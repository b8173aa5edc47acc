//! TOML configuration (`prompt_pad.toml`).
//!
//! Every section is optional; missing keys fall back to their defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::logging::LogLevel;
use crate::prompt::{EndpointSettings, PollSettings, SubmitMode};
use crate::workspace::LayoutSettings;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "prompt_pad.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: EndpointSettings,
    pub submit: SubmitSettings,
    pub poll: PollSettings,
    pub layout: LayoutSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubmitSettings {
    pub mode: SubmitMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub path: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".prompt_pad/session.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// No file logging when unset.
    pub path: Option<PathBuf>,
    pub max_bytes: u64,
    pub level: LogLevel,
    pub log_keys: bool,
    pub log_mouse: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_bytes: 1024 * 1024,
            level: LogLevel::Info,
            log_keys: false,
            log_mouse: false,
        }
    }
}

impl AppConfig {
    pub fn from_toml(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }
}

/// Load `path`, or defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => AppConfig::from_toml(&raw, path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.poll.warmup_secs, 8);
        assert_eq!(config.layout.maximize_slack, 1);
        assert_eq!(config.submit.mode, SubmitMode::Single);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
[endpoint]
base_url = "http://backend:8080"

[submit]
mode = "polling"

[poll]
max_duration_secs = 300

[logging]
path = "pad.log"
level = "debug"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.endpoint.base_url, "http://backend:8080");
        assert_eq!(config.endpoint.submit_path, "/save_files");
        assert_eq!(config.submit.mode, SubmitMode::Polling);
        assert_eq!(config.poll.max_duration_secs, Some(300));
        assert_eq!(config.poll.interval_ms, 100);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.path, Some(PathBuf::from("pad.log")));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = AppConfig::from_toml("[poll\ninterval_ms = 1", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }
}
