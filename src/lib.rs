//! # drift
//!
//! Plain SQL migrations for PostgreSQL.
//!
//! drift provides:
//! - Migration files named `<id>-<slug>.sql`, applied in ascending ID order
//! - A `schema_migrations` ledger in the target database, written in the same
//!   transaction as each migration body
//! - Opt-out of the wrapping transaction with a `--drift:no-transaction` line
//! - File creation from templates and renumbering for filesystem sorting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use drift::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = PgDatabase::connect("postgresql://localhost/mydb").await?;
//!     let config = MigrationConfig::new().migrations_dir("migrations");
//!
//!     let mut engine = MigrationEngine::new(config, db);
//!     let result = engine.migrate().await?;
//!     println!("{}", result.summary());
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Migration files, the ledger, and the engine that reconciles them.
pub mod migrate {
    pub use drift_migrate::*;
}

/// PostgreSQL database handle.
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres {
    pub use drift_postgres::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        MigrateResult, MigrationConfig, MigrationDatabase, MigrationEngine, MigrationError,
        MigrationFile, MigrationFileManager, MigrationId, MigrationResult, MigrationTemplate,
        RenumberPlan,
    };

    #[cfg(feature = "postgres")]
    pub use crate::postgres::{PgConfig, PgDatabase};
}

// Re-export key types at the crate root
pub use drift_migrate::{MigrationEngine, MigrationError, MigrationId};
