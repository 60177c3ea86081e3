//! Migration engine implementation.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{MigrateResult, MigrationError};
use crate::file::{MigrationFile, MigrationFileManager};
use crate::history::{MigrationDatabase, MigrationRecord, applied_migrations};
use crate::id::MigrationId;

/// Configuration for the migration engine.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Path to the migrations directory.
    pub migrations_dir: PathBuf,
    /// Highest migration ID to apply. `None` applies everything.
    pub upto: Option<MigrationId>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("migrations"),
            upto: None,
        }
    }
}

impl MigrationConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the migrations directory.
    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }

    /// Stop at this migration ID (inclusive).
    pub fn upto(mut self, upto: Option<MigrationId>) -> Self {
        self.upto = upto;
        self
    }
}

/// Pending work computed from the files on disk and the ledger.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    /// Unapplied migrations in ascending ID order.
    pub pending: Vec<MigrationFile>,
    /// Unapplied migrations above the ceiling, in ascending ID order.
    pub skipped: Vec<MigrationFile>,
}

impl MigrationPlan {
    /// Reconcile available files against applied IDs.
    pub fn new(
        applied: &HashSet<MigrationId>,
        available: Vec<MigrationFile>,
        ceiling: Option<MigrationId>,
    ) -> Self {
        let mut unapplied: Vec<MigrationFile> = available
            .into_iter()
            .filter(|f| !applied.contains(&f.id))
            .collect();
        unapplied.sort_by_key(|f| f.id);

        let mut plan = Self::default();
        for file in unapplied {
            match ceiling {
                Some(upto) if file.id > upto => {
                    debug!(
                        migration = %file.name,
                        upto = %upto,
                        "Skipping migration above ceiling"
                    );
                    plan.skipped.push(file);
                }
                _ => plan.pending.push(file),
            }
        }
        plan
    }

    /// Check if there's anything to migrate.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Unapplied migrations at or below `ceiling`, sorted by ID.
pub fn pending(
    applied: &HashSet<MigrationId>,
    available: Vec<MigrationFile>,
    ceiling: Option<MigrationId>,
) -> Vec<MigrationFile> {
    MigrationPlan::new(applied, available, ceiling).pending
}

/// Result of a migration operation.
#[derive(Debug, Clone, Default)]
pub struct MigrationResult {
    /// File names of applied migrations, in order.
    pub applied_migrations: Vec<String>,
    /// File names of unapplied migrations left out by the ceiling.
    pub skipped_migrations: Vec<String>,
    /// Total duration in milliseconds.
    pub duration_ms: i64,
}

impl MigrationResult {
    /// Number of migrations applied.
    pub fn applied_count(&self) -> usize {
        self.applied_migrations.len()
    }

    /// Check if any migrations were applied.
    pub fn has_changes(&self) -> bool {
        !self.applied_migrations.is_empty()
    }

    /// Get a summary of the result.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if self.has_changes() {
            parts.push(format!("{} applied", self.applied_count()));
        }

        if !self.skipped_migrations.is_empty() {
            parts.push(format!("{} skipped", self.skipped_migrations.len()));
        }

        if parts.is_empty() {
            "No migrations applied".to_string()
        } else {
            format!("{} in {}ms", parts.join(", "), self.duration_ms)
        }
    }
}

/// Migration status information.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Ledger rows, in ascending ID order.
    pub applied: Vec<MigrationRecord>,
    /// Unapplied migration files, in ascending ID order.
    pub pending: Vec<MigrationFile>,
    /// Ledger rows with no matching file on disk.
    pub missing: Vec<MigrationRecord>,
}

/// Apply a single migration.
///
/// Files carrying the no-transaction directive are executed as-is and must
/// claim themselves. Everything else runs as `BEGIN; claim; body; COMMIT`,
/// rolling back if either step fails.
pub async fn apply_migration<D>(db: &mut D, file: &MigrationFile) -> MigrateResult<()>
where
    D: MigrationDatabase + ?Sized,
{
    if !file.is_transactional() {
        debug!(migration = %file.name, "Running without transaction");
        return db
            .execute(&file.content)
            .await
            .map_err(|e| MigrationError::execution(&file.name, e));
    }

    db.begin()
        .await
        .map_err(|e| MigrationError::execution(&file.name, e))?;

    let outcome = match db.claim(file.id, &file.slug).await {
        Ok(()) => db.execute(&file.content).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => db
            .commit()
            .await
            .map_err(|e| MigrationError::execution(&file.name, e)),
        Err(e) => {
            if let Err(rollback_err) = db.rollback().await {
                warn!(migration = %file.name, error = %rollback_err, "Rollback failed");
            }
            Err(MigrationError::execution(&file.name, e))
        }
    }
}

/// The main migration engine.
pub struct MigrationEngine<D: MigrationDatabase> {
    config: MigrationConfig,
    db: D,
    file_manager: MigrationFileManager,
}

impl<D: MigrationDatabase> MigrationEngine<D> {
    /// Create a new migration engine.
    pub fn new(config: MigrationConfig, db: D) -> Self {
        let file_manager = MigrationFileManager::new(&config.migrations_dir);
        Self {
            config,
            db,
            file_manager,
        }
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Get the database handle.
    pub fn database(&self) -> &D {
        &self.db
    }

    /// Consume the engine and return the database handle.
    pub fn into_database(self) -> D {
        self.db
    }

    /// Compute pending migrations without applying anything.
    pub async fn plan(&mut self) -> MigrateResult<MigrationPlan> {
        let applied: HashSet<MigrationId> = applied_migrations(&mut self.db)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        let files = self.file_manager.list_migrations().await?;
        Ok(MigrationPlan::new(&applied, files, self.config.upto))
    }

    /// Apply pending migrations.
    pub async fn migrate(&mut self) -> MigrateResult<MigrationResult> {
        self.migrate_until_interrupted(&AtomicBool::new(false)).await
    }

    /// Apply pending migrations in ID order, stopping at the first failure.
    ///
    /// `interrupted` is checked before each migration; a migration already in
    /// flight always runs to commit or rollback.
    pub async fn migrate_until_interrupted(
        &mut self,
        interrupted: &AtomicBool,
    ) -> MigrateResult<MigrationResult> {
        let start = Instant::now();
        let plan = self.plan().await?;

        let mut result = MigrationResult {
            skipped_migrations: plan.skipped.iter().map(|f| f.name.clone()).collect(),
            ..Default::default()
        };

        for file in &plan.pending {
            if interrupted.load(Ordering::SeqCst) {
                return Err(MigrationError::Interrupted {
                    applied: result.applied_count(),
                });
            }

            info!(migration = %file.name, "Applying migration");
            apply_migration(&mut self.db, file).await?;
            result.applied_migrations.push(file.name.clone());
        }

        result.duration_ms = start.elapsed().as_millis() as i64;
        info!("All migrations applied!");
        Ok(result)
    }

    /// Get migration status.
    pub async fn status(&mut self) -> MigrateResult<MigrationStatus> {
        let applied = applied_migrations(&mut self.db).await?;
        let files = self.file_manager.list_migrations().await?;

        let on_disk: HashSet<MigrationId> = files.iter().map(|f| f.id).collect();
        let missing = applied
            .iter()
            .filter(|r| !on_disk.contains(&r.id))
            .cloned()
            .collect();

        let applied_ids: HashSet<MigrationId> = applied.iter().map(|r| r.id).collect();
        let pending = pending(&applied_ids, files, None);

        Ok(MigrationStatus {
            applied,
            pending,
            missing,
        })
    }
}
