//! Migration history tracking.
//!
//! The ledger lives in the database being migrated. It is created by the
//! bootstrap migration, so its absence simply means nothing has been applied
//! yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MigrateResult;
use crate::id::MigrationId;

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "schema_migrations";

/// Name of the SQL function that records a migration as applied.
pub const CLAIM_FUNCTION: &str = "_drift_claim_migration";

/// Bootstrap migration that creates the ledger and the claim function.
pub const INIT_SQL: &str = include_str!("../templates/init.sql");

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Migration ID.
    pub id: MigrationId,
    /// Slug recorded when the migration was claimed.
    pub slug: String,
    /// When the migration was applied.
    pub run_at: DateTime<Utc>,
}

/// The database operations the migration engine needs.
///
/// Implementations wrap a single connection. Transactions are driven
/// explicitly through [`begin`](Self::begin), [`commit`](Self::commit) and
/// [`rollback`](Self::rollback); statements issued between `begin` and
/// `commit` must run inside that transaction.
#[async_trait::async_trait]
pub trait MigrationDatabase: Send {
    /// All ledger rows ordered by ID ascending.
    ///
    /// Must fail with [`MigrationError::UndefinedTable`] when the ledger table
    /// does not exist.
    ///
    /// [`MigrationError::UndefinedTable`]: crate::error::MigrationError::UndefinedTable
    async fn applied(&mut self) -> MigrateResult<Vec<MigrationRecord>>;

    /// Execute raw SQL, possibly containing several statements.
    async fn execute(&mut self, sql: &str) -> MigrateResult<()>;

    /// Insert `(id, slug)` into the ledger. Fails if the ID is already there.
    async fn claim(&mut self, id: MigrationId, slug: &str) -> MigrateResult<()>;

    /// Begin a transaction.
    async fn begin(&mut self) -> MigrateResult<()>;

    /// Commit the open transaction.
    async fn commit(&mut self) -> MigrateResult<()>;

    /// Roll back the open transaction.
    async fn rollback(&mut self) -> MigrateResult<()>;
}

/// Read the ledger, treating a missing ledger table as empty.
pub async fn applied_migrations<D>(db: &mut D) -> MigrateResult<Vec<MigrationRecord>>
where
    D: MigrationDatabase + ?Sized,
{
    match db.applied().await {
        Err(e) if e.is_undefined_table() => {
            debug!(error = %e, "Ledger table not found, assuming no migrations applied");
            Ok(Vec::new())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrationError;

    struct Ledger(Option<MigrateResult<Vec<MigrationRecord>>>);

    #[async_trait::async_trait]
    impl MigrationDatabase for Ledger {
        async fn applied(&mut self) -> MigrateResult<Vec<MigrationRecord>> {
            self.0.take().expect("applied called once")
        }
        async fn execute(&mut self, _sql: &str) -> MigrateResult<()> {
            Ok(())
        }
        async fn claim(&mut self, _id: MigrationId, _slug: &str) -> MigrateResult<()> {
            Ok(())
        }
        async fn begin(&mut self) -> MigrateResult<()> {
            Ok(())
        }
        async fn commit(&mut self) -> MigrateResult<()> {
            Ok(())
        }
        async fn rollback(&mut self) -> MigrateResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_missing_ledger_is_empty() {
        let mut db = Ledger(Some(Err(MigrationError::undefined_table(
            "relation \"schema_migrations\" does not exist",
        ))));
        assert!(applied_migrations(&mut db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let mut db = Ledger(Some(Err(MigrationError::database("connection reset"))));
        assert!(matches!(
            applied_migrations(&mut db).await,
            Err(MigrationError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_records_pass_through() {
        let record = MigrationRecord {
            id: MigrationId::INIT,
            slug: "init".to_string(),
            run_at: Utc::now(),
        };
        let mut db = Ledger(Some(Ok(vec![record.clone()])));
        assert_eq!(applied_migrations(&mut db).await.unwrap(), vec![record]);
    }

    #[test]
    fn test_init_sql_creates_ledger() {
        assert!(INIT_SQL.contains(LEDGER_TABLE));
        assert!(INIT_SQL.contains(CLAIM_FUNCTION));
        assert!(crate::file::has_no_transaction_directive(INIT_SQL));
    }
}
