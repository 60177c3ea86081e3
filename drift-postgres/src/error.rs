//! Error types for PostgreSQL operations.

use drift_migrate::MigrationError;
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur during PostgreSQL operations.
#[derive(Error, Debug)]
pub enum PgError {
    /// PostgreSQL error.
    #[error("postgres error: {}", describe(.0))]
    Postgres(#[from] tokio_postgres::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Postgres(e) => e.is_closed(),
            Self::Config(_) => false,
        }
    }

    /// Check if the server reported `undefined_table` (SQLSTATE 42P01).
    pub fn is_undefined_table(&self) -> bool {
        matches!(self, Self::Postgres(e) if e.code() == Some(&SqlState::UNDEFINED_TABLE))
    }
}

impl From<PgError> for MigrationError {
    fn from(err: PgError) -> Self {
        if err.is_undefined_table() {
            return MigrationError::undefined_table(err.to_string());
        }
        MigrationError::database(err.to_string())
    }
}

/// Render a driver error with the server's message, detail and hint.
fn describe(err: &tokio_postgres::Error) -> String {
    let Some(db) = err.as_db_error() else {
        return err.to_string();
    };

    let mut msg = format!("{}: {} ({})", db.severity(), db.message(), db.code().code());
    if let Some(detail) = db.detail() {
        msg.push_str(&format!("\nDETAIL: {}", detail));
    }
    if let Some(hint) = db.hint() {
        msg.push_str(&format!("\nHINT: {}", hint));
    }
    msg
}
