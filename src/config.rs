// Client configuration: rc file plus environment overrides

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::lifecycle::Placement;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },
    #[error("Invalid value for {key} on line {line}: '{value}'")]
    InvalidValue { key: String, value: String, line: usize },
    #[error("Malformed config line {line}: '{text}' (expected key=value)")]
    Malformed { line: usize, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub rollback_placement: Placement,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            rollback_placement: Placement::Head,
        }
    }
}

impl Config {
    /// `~/.foco/rc`, if a home directory can be found
    pub fn rc_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".foco").join("rc"))
    }

    /// Defaults, then the rc file, then `FOCO_API_URL` / `FOCO_TOKEN`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::rc_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(
            std::env::var("FOCO_API_URL").ok(),
            std::env::var("FOCO_TOKEN").ok(),
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse_rc(&contents)
    }

    /// Parse rc contents over the defaults. Unknown keys are ignored.
    pub fn parse_rc(contents: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for (index, raw) in contents.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Malformed {
                line: line_no,
                text: line.to_string(),
            })?;
            let (key, value) = (key.trim(), value.trim());
            let invalid = || ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                line: line_no,
            };

            match key {
                "api.url" => {
                    if value.is_empty() {
                        return Err(invalid());
                    }
                    config.api_url = value.to_string();
                }
                "api.token" => {
                    config.token = (!value.is_empty()).then(|| value.to_string());
                }
                "api.timeout" => {
                    config.timeout_secs = value.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(invalid)?;
                }
                "rollback.placement" => {
                    config.rollback_placement = Placement::from_str(value).ok_or_else(invalid)?;
                }
                other => log::debug!("ignoring unknown config key '{}'", other),
            }
        }
        Ok(config)
    }

    fn apply_env(&mut self, api_url: Option<String>, token: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token.trim().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.token, None);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.rollback_placement, Placement::Head);
    }

    #[test]
    fn test_parse_rc() {
        let rc = "\
# task service
api.url = https://tasks.example.com
api.token=abc123
api.timeout=30

rollback.placement=original
theme=dark
";
        let config = Config::parse_rc(rc).unwrap();
        assert_eq!(config.api_url, "https://tasks.example.com");
        assert_eq!(config.token.as_deref(), Some("abc123"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.rollback_placement, Placement::Original);
    }

    #[test]
    fn test_unknown_placement_is_error() {
        let err = Config::parse_rc("rollback.placement=tail").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "rollback.placement".into(),
                value: "tail".into(),
                line: 1
            }
        );
    }

    #[test]
    fn test_bad_timeout_and_malformed_line() {
        assert!(Config::parse_rc("api.timeout=0").is_err());
        assert!(Config::parse_rc("api.timeout=soon").is_err());
        assert!(matches!(
            Config::parse_rc("\napi.url").unwrap_err(),
            ConfigError::Malformed { line: 2, .. }
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::parse_rc("api.url=http://a\napi.token=file").unwrap();
        config.apply_env(Some("http://b".into()), None);
        assert_eq!(config.api_url, "http://b");
        assert_eq!(config.token.as_deref(), Some("file"));

        config.apply_env(Some("  ".into()), Some("env".into()));
        assert_eq!(config.api_url, "http://b");
        assert_eq!(config.token.as_deref(), Some("env"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rc");
        std::fs::write(&path, "api.url=http://127.0.0.1:9\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().api_url, "http://127.0.0.1:9");
        assert!(matches!(
            Config::from_file(&dir.path().join("missing")),
            Err(ConfigError::Read { .. })
        ));
    }
}
