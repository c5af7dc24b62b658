//! Error types and handling for the FMI integration

use thiserror::Error;

/// Main error type for the FMI integration
#[derive(Error, Debug)]
pub enum FmiError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Communication errors with FMI or the geocoder
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Malformed payloads from remote services
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// A coordinator refresh failed
    #[error("Update failed: {message}")]
    Update { message: String },

    /// The first refresh of a config entry failed
    #[error("Entry not ready: {message}")]
    NotReady { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl FmiError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new update error
    pub fn update<S: Into<String>>(message: S) -> Self {
        Self::Update {
            message: message.into(),
        }
    }

    /// Create a new not-ready error
    pub fn not_ready<S: Into<String>>(message: S) -> Self {
        Self::NotReady {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            FmiError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            FmiError::Api { .. } => {
                "Unable to reach FMI services. Please check your internet connection.".to_string()
            }
            FmiError::Validation { message } => format!("Invalid input: {message}"),
            FmiError::Parse { .. } => "FMI returned data that could not be read.".to_string(),
            FmiError::Update { message } => format!("Weather update failed: {message}"),
            FmiError::NotReady { .. } => {
                "FMI is not reachable yet. The integration will retry later.".to_string()
            }
            FmiError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            FmiError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for FmiError {
    fn from(err: reqwest::Error) -> Self {
        FmiError::api(err.to_string())
    }
}

impl From<reqwest_middleware::Error> for FmiError {
    fn from(err: reqwest_middleware::Error) -> Self {
        FmiError::api(err.to_string())
    }
}

impl From<anyhow::Error> for FmiError {
    fn from(err: anyhow::Error) -> Self {
        FmiError::cache(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = FmiError::config("missing latitude");
        assert!(matches!(config_err, FmiError::Config { .. }));

        let api_err = FmiError::api("connection failed");
        assert!(matches!(api_err, FmiError::Api { .. }));

        let update_err = FmiError::update("timed out");
        assert!(matches!(update_err, FmiError::Update { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = FmiError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = FmiError::api("test");
        assert!(api_err.user_message().contains("Unable to reach"));

        let validation_err = FmiError::validation("bad latitude");
        assert!(validation_err.user_message().contains("bad latitude"));
    }

    #[test]
    fn test_display_keeps_message() {
        let err = FmiError::update("server said no");
        assert_eq!(err.to_string(), "Update failed: server said no");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let fmi_err: FmiError = io_err.into();
        assert!(matches!(fmi_err, FmiError::Io { .. }));
    }
}
