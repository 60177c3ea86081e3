//! Error types for the migration engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::id::MigrationId;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A migration ID was constructed from a negative number.
    #[error("migration ID must not be negative: {0}")]
    NegativeId(i64),

    /// A migration ID could not be parsed as a 64-bit integer.
    #[error("not a valid migration ID: {0}")]
    InvalidId(String),

    /// Two migrations share the same ID.
    #[error("duplicate migration ID {id}: {first}, {second}")]
    DuplicateId {
        /// The contested ID.
        id: MigrationId,
        /// The migration that already holds the ID.
        first: String,
        /// The migration that collided with it.
        second: String,
    },

    /// The migrations ledger table does not exist yet.
    #[error("undefined table: {0}")]
    UndefinedTable(String),

    /// Database operation error.
    #[error("database error: {0}")]
    Database(String),

    /// A migration failed to claim or execute.
    #[error("migration {migration} failed: {source}")]
    Execution {
        /// File name of the failing migration.
        migration: String,
        /// The underlying failure.
        #[source]
        source: Box<MigrationError>,
    },

    /// File system error with the path that triggered it.
    #[error("{path}: {source}")]
    Filesystem {
        /// Path being listed, read, written, or renamed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed migration template.
    #[error("template error: {0}")]
    Template(String),

    /// The run was interrupted between migrations.
    #[error("interrupted after applying {applied} migration(s)")]
    Interrupted {
        /// Number of migrations committed before the interrupt.
        applied: usize,
    },
}

impl MigrationError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create an undefined table error.
    pub fn undefined_table(msg: impl Into<String>) -> Self {
        Self::UndefinedTable(msg.into())
    }

    /// Create a template error.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Create a duplicate ID error.
    pub fn duplicate_id(
        id: MigrationId,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::DuplicateId {
            id,
            first: first.into(),
            second: second.into(),
        }
    }

    /// Wrap an I/O error with the path it concerns.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Wrap a claim or execution failure with the migration's file name.
    pub fn execution(migration: impl Into<String>, source: MigrationError) -> Self {
        Self::Execution {
            migration: migration.into(),
            source: Box::new(source),
        }
    }

    /// Check if this error means the ledger table is missing.
    pub fn is_undefined_table(&self) -> bool {
        matches!(self, Self::UndefinedTable(_))
    }
}
