//! Common error handling utilities and conventions

/// Standard result type for core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Core error types that can be shared across crates
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Unknown resource: {name}")]
    UnknownResource { name: String },
}

impl CoreError {
    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid token error
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Create an unknown resource error
    pub fn unknown_resource(name: impl Into<String>) -> Self {
        Self::UnknownResource { name: name.into() }
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        Self::invalid_config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_become_invalid_config() {
        let err = CoreError::from(config::ConfigError::Message(
            "api.base_url: cannot be empty".into(),
        ));
        assert_eq!(
            err,
            CoreError::invalid_config("api.base_url: cannot be empty")
        );
        assert_eq!(
            err.to_string(),
            "Invalid configuration: api.base_url: cannot be empty"
        );
    }
}
