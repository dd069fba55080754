//! Console client configuration

use crate::error::CoreResult;
use crate::validation::{ValidateConfig, validators};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the state directory
pub const STATE_DIR_ENV: &str = "IGEN_STATE_DIR";

/// Console client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Session lifecycle settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every relative endpoint path is joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Transport timeout in seconds (0 = none)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Override for the User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Session lifecycle settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Login entry point reported when a session is torn down
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Refresh-and-replay cycles allowed per original request
    #[serde(default = "default_max_refresh_attempts")]
    pub max_refresh_attempts: u32,

    /// Directory holding persisted credentials and logs
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/api/".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_login_path() -> String {
    "/".to_string()
}

const fn default_max_refresh_attempts() -> u32 {
    1
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            max_refresh_attempts: default_max_refresh_attempts(),
            state_dir: None,
        }
    }
}

impl ApiConfig {
    /// Transport timeout, `None` when disabled
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

impl SessionConfig {
    /// Resolve the state directory: configured value, then `IGEN_STATE_DIR`,
    /// then the platform data directory
    pub fn resolve_state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
            return PathBuf::from(dir);
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("igen")
    }
}

impl ClientConfig {
    /// Load configuration from defaults, the first config file found in the
    /// usual locations, and `IGEN__*` environment variables
    pub fn load() -> CoreResult<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let config_paths = ["igen.toml", "config/igen.toml"];
        for path in &config_paths {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("IGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("IGEN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl ValidateConfig for ClientConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validators::validate_not_empty(&self.api.base_url, "api.base_url")?;
        validators::validate_url(&self.api.base_url, "api.base_url")?;
        validators::validate_rooted_path(&self.session.login_path, "session.login_path")?;
        validators::validate_range(
            self.session.max_refresh_attempts,
            0,
            3,
            "session.max_refresh_attempts",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8000/api/");
        assert_eq!(config.api.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.session.login_path, "/");
        assert_eq!(config.session.max_refresh_attempts, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_disables_timeout() {
        let api = ApiConfig {
            timeout_secs: 0,
            ..ApiConfig::default()
        };
        assert_eq!(api.timeout(), None);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://console.example.com/api/"

[session]
max_refresh_attempts = 2
state_dir = "/var/lib/igen"
"#
        )
        .unwrap();

        let config = ClientConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://console.example.com/api/");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.session.login_path, "/");
        assert_eq!(config.session.max_refresh_attempts, 2);
        assert_eq!(
            config.session.resolve_state_dir(),
            PathBuf::from("/var/lib/igen")
        );
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[session]
login_path = "login"
"#
        )
        .unwrap();

        let err = ClientConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
        assert!(err.to_string().contains("session.login_path"));
    }

    #[test]
    fn test_validate_rejects_excessive_refresh_attempts() {
        let mut config = ClientConfig::default();
        config.session.max_refresh_attempts = 10;
        assert!(config.validate().is_err());
    }
}
