use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default number of commits returned by `git log`
pub const DEFAULT_LOG_TAIL: usize = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Tunables for a [`Repository`](crate::Repository)
///
/// Every section is optional in the TOML form; missing values take their
/// defaults.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub shell: ShellSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ShellSettings {
    /// Kill git commands running longer than this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    /// Extra environment variables removed before running git
    pub clear_env_vars: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogSettings {
    pub tail: usize,
    pub full_hashes: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            tail: DEFAULT_LOG_TAIL,
            full_hashes: false,
        }
    }
}

impl ShellSettings {
    /// Configured timeout as a `Duration`
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Save settings to a TOML file, creating parent directories
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        // Validate before saving
        self.validate()?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log.tail == 0 {
            return Err(ConfigError::InvalidValue(
                "log.tail must be greater than 0".to_string(),
            ));
        }

        if self.shell.timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidValue(
                "shell.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        for name in &self.shell.clear_env_vars {
            if name.is_empty() || name.contains('=') {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid environment variable name: {:?}",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.log.tail, DEFAULT_LOG_TAIL);
        assert!(!settings.log.full_hashes);
        assert!(settings.shell.timeout().is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_toml() {
        let settings = Settings::from_toml_str(
            r#"
            [shell]
            timeout_seconds = 45
            clear_env_vars = ["GIT_SSH_COMMAND"]

            [log]
            full_hashes = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.shell.timeout(), Some(Duration::from_secs(45)));
        assert_eq!(settings.shell.clear_env_vars, vec!["GIT_SSH_COMMAND"]);
        assert!(settings.log.full_hashes);
        assert_eq!(settings.log.tail, DEFAULT_LOG_TAIL);
    }

    #[test]
    fn test_validate_zero_tail() {
        let result = Settings::from_toml_str("[log]\ntail = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut settings = Settings::default();
        settings.shell.timeout_seconds = Some(0);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_bad_env_name() {
        let mut settings = Settings::default();
        settings.shell.clear_env_vars = vec!["A=B".to_string()];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let result = Settings::from_toml_str("[log\ntail = ");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("gitshell.toml");

        let mut settings = Settings::default();
        settings.shell.timeout_seconds = Some(120);
        settings.log.tail = 50;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }
}
