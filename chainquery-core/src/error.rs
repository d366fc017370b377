//! Error types for chainquery

use thiserror::Error;

/// The main error type for chainquery operations
#[derive(Error, Debug)]
pub enum Error {
    /// A builder call was given something it cannot represent
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The executor failed outside of the database engine itself
    #[error("Execution error: {message}")]
    Execution { message: String },

    /// Engine-reported error (malformed SQL, missing table, connection failure)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The text-to-SQL oracle failed or answered with something unusable
    #[error("Oracle error: {message}")]
    Oracle { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Configuration file is not valid TOML
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for chainquery operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Create a new oracle error
    pub fn oracle(message: impl Into<String>) -> Self {
        Self::Oracle {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = Error::validation("join requires at least one condition");
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(
            err.to_string(),
            "Validation error: join requires at least one condition"
        );
    }

    #[test]
    fn test_execution_error() {
        let err = Error::execution("unsupported output format 'Parquet'");
        assert!(matches!(err, Error::Execution { .. }));
        assert_eq!(
            err.to_string(),
            "Execution error: unsupported output format 'Parquet'"
        );
    }

    #[test]
    fn test_oracle_error() {
        let err = Error::oracle("status 529");
        assert!(matches!(err, Error::Oracle { .. }));
        assert_eq!(err.to_string(), "Oracle error: status 529");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("batch_size must be > 0");
        assert_eq!(err.to_string(), "Configuration error: batch_size must be > 0");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
