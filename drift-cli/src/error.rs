//! CLI error types and result alias.

use drift_migrate::MigrationError;
use drift_postgres::PgError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(drift::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(drift::config))]
    Config(String),

    /// Migration error
    #[error("{0}")]
    #[diagnostic(code(drift::migration))]
    Migration(#[from] MigrationError),

    /// Database connection error
    #[error("Database error: {0}")]
    #[diagnostic(code(drift::database))]
    Database(String),
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<PgError> for CliError {
    fn from(err: PgError) -> Self {
        CliError::Database(err.to_string())
    }
}
