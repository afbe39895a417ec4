use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Ingestion errors (CSV shape, timestamps, interval ordering)
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Core engine errors
    #[error("Analytics error: {0}")]
    Analytics(String),

    /// Validation errors (caller-supplied parameters)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Run-history database errors
    #[error("Database error: {0}")]
    Database(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Report export errors
    #[error("Export error: {0}")]
    Export(String),
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from csv::Error (report export)
impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Export(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
