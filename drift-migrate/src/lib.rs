//! # drift-migrate
//!
//! Migration engine for drift.
//!
//! This crate provides functionality for:
//! - Discovering migration files named `<digits>-<slug>.sql`
//! - Reading the ledger of applied migrations from the database
//! - Computing the pending set in ascending ID order
//! - Applying each migration with an atomic ledger claim
//! - Creating new migration files from templates
//! - Renumbering files so string order matches numeric order
//!
//! ## Architecture
//!
//! Migrations are opaque SQL text. Their only identity is the integer ID in
//! the file name; the database records applied IDs in `schema_migrations`.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ Migrations   │────▶│ Migration Plan │◀────│ Ledger      │
//! │ directory    │     │ (pending, IDs) │     │ (database)  │
//! └──────────────┘     └────────────────┘     └─────────────┘
//!                              │
//!                              ▼
//!                      ┌────────────────┐
//!                      │ BEGIN; claim;  │
//!                      │ body; COMMIT   │
//!                      └────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use drift_migrate::{MigrateResult, MigrationConfig, MigrationDatabase, MigrationEngine};
//!
//! async fn run_migrations(db: impl MigrationDatabase) -> MigrateResult<()> {
//!     let config = MigrationConfig::new().migrations_dir("./migrations");
//!     let mut engine = MigrationEngine::new(config, db);
//!
//!     let result = engine.migrate().await?;
//!     println!("{}", result.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Transactions
//!
//! Every migration runs in its own transaction together with a call to
//! `_drift_claim_migration(id, slug)`, so a failed migration is never
//! recorded as applied. A file containing the line `--drift:no-transaction`
//! is executed verbatim instead and must record itself; the bootstrap
//! migration written by `setup` works this way because it creates the ledger.

pub mod engine;
pub mod error;
pub mod file;
pub mod history;
pub mod id;
pub mod renumber;
pub mod template;

// Re-exports
pub use engine::{
    MigrationConfig, MigrationEngine, MigrationPlan, MigrationResult, MigrationStatus,
    apply_migration, pending,
};
pub use error::{MigrateResult, MigrationError};
pub use file::{
    MigrationFile, MigrationFileManager, NO_TRANSACTION_DIRECTIVE, filename, id_width, slugify,
};
pub use history::{MigrationDatabase, MigrationRecord, applied_migrations};
pub use id::MigrationId;
pub use renumber::{Rename, RenumberPlan};
pub use template::{DEFAULT_TEMPLATE, MigrationTemplate};
