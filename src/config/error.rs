//! Configuration error types.

use thiserror::Error;

/// Errors raised while resolving process configuration.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing environment variables: {}", missing.join(", "))]
    MissingVariables { missing: Vec<String> },

    #[error("Invalid value for {variable}: {message}")]
    InvalidValue { variable: String, message: String },
}

impl ConfigurationError {
    pub fn invalid_value(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            variable: variable.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;
