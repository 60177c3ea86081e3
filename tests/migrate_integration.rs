//! End-to-end tests for applying migrations.
//!
//! These tests run the engine against real migration directories and an
//! in-memory ledger that honours transactions the way PostgreSQL does.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use drift::prelude::*;
use drift::migrate::{MigrationRecord, apply_migration};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Every call the engine made, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Begin,
    Claim(i64),
    Execute(String),
    Commit,
    Rollback,
}

/// In-memory stand-in for a PostgreSQL database.
///
/// A body containing `CREATE TABLE schema_migrations` creates the ledger, and
/// `_drift_claim_migration(<id>, '<slug>')` inside a body claims that ID. A
/// body containing `boom` fails. When `interrupt_on_commit` is set, the flag
/// is raised by the first commit, as if Ctrl-C arrived mid-migration.
#[derive(Debug, Default)]
struct MemoryDatabase {
    ledger: Option<BTreeMap<i64, String>>,
    snapshot: Option<Option<BTreeMap<i64, String>>>,
    calls: Vec<Call>,
    interrupt_on_commit: Option<Arc<AtomicBool>>,
}

impl MemoryDatabase {
    fn ledger_ids(&self) -> Vec<i64> {
        self.ledger
            .as_ref()
            .map(|l| l.keys().copied().collect())
            .unwrap_or_default()
    }

    fn claim_inline(&mut self, sql: &str) -> MigrateResult<()> {
        let marker = "_drift_claim_migration(";
        for line in sql.lines().filter(|l| l.trim_start().starts_with("SELECT")) {
            if let Some(start) = line.find(marker) {
                let args = &line[start + marker.len()..];
                let (id, rest) = args.split_once(',').unwrap();
                let slug = rest.trim().trim_start_matches('\'');
                let slug = &slug[..slug.find('\'').unwrap()];
                self.insert(id.trim().parse().unwrap(), slug)?;
            }
        }
        Ok(())
    }

    fn insert(&mut self, id: i64, slug: &str) -> MigrateResult<()> {
        let ledger = self
            .ledger
            .as_mut()
            .ok_or_else(|| MigrationError::undefined_table("schema_migrations"))?;
        if ledger.contains_key(&id) {
            return Err(MigrationError::database(format!(
                "duplicate key value violates unique constraint (id)=({id})"
            )));
        }
        ledger.insert(id, slug.to_string());
        Ok(())
    }
}

#[async_trait::async_trait]
impl MigrationDatabase for MemoryDatabase {
    async fn applied(&mut self) -> MigrateResult<Vec<MigrationRecord>> {
        let ledger = self
            .ledger
            .as_ref()
            .ok_or_else(|| MigrationError::undefined_table("schema_migrations"))?;
        Ok(ledger
            .iter()
            .map(|(id, slug)| MigrationRecord {
                id: MigrationId::new(*id).unwrap(),
                slug: slug.clone(),
                run_at: Utc::now(),
            })
            .collect())
    }

    async fn execute(&mut self, sql: &str) -> MigrateResult<()> {
        self.calls.push(Call::Execute(sql.to_string()));
        if sql.contains("boom") {
            return Err(MigrationError::database("syntax error at or near \"boom\""));
        }
        if sql.contains("CREATE TABLE schema_migrations") {
            self.ledger.get_or_insert_with(BTreeMap::new);
        }
        self.claim_inline(sql)
    }

    async fn claim(&mut self, id: MigrationId, slug: &str) -> MigrateResult<()> {
        self.calls.push(Call::Claim(id.get()));
        self.insert(id.get(), slug)
    }

    async fn begin(&mut self) -> MigrateResult<()> {
        self.calls.push(Call::Begin);
        self.snapshot = Some(self.ledger.clone());
        Ok(())
    }

    async fn commit(&mut self) -> MigrateResult<()> {
        self.calls.push(Call::Commit);
        self.snapshot = None;
        if let Some(flag) = &self.interrupt_on_commit {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> MigrateResult<()> {
        self.calls.push(Call::Rollback);
        if let Some(snapshot) = self.snapshot.take() {
            self.ledger = snapshot;
        }
        Ok(())
    }
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

async fn setup_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    MigrationFileManager::new(temp_dir.path())
        .setup()
        .await
        .unwrap();
    temp_dir
}

fn new_engine(dir: &Path, db: MemoryDatabase) -> MigrationEngine<MemoryDatabase> {
    MigrationEngine::new(MigrationConfig::new().migrations_dir(dir), db)
}

fn new_engine_upto(dir: &Path, upto: i64) -> MigrationEngine<MemoryDatabase> {
    let config = MigrationConfig::new()
        .migrations_dir(dir)
        .upto(Some(MigrationId::new(upto).unwrap()));
    MigrationEngine::new(config, MemoryDatabase::default())
}

#[tokio::test]
async fn test_fresh_database_applies_everything() {
    let temp_dir = setup_dir().await;
    write(temp_dir.path(), "5-add_users.sql", "CREATE TABLE users (id int);\n");

    let mut engine = new_engine(temp_dir.path(), MemoryDatabase::default());
    let result = engine.migrate().await.unwrap();

    assert_eq!(result.applied_migrations, vec!["0-init.sql", "5-add_users.sql"]);
    let db = engine.into_database();
    assert_eq!(db.ledger_ids(), vec![0, 5]);

    // The bootstrap migration manages its own transaction.
    assert!(matches!(
        &db.calls[0],
        Call::Execute(sql) if sql.contains("CREATE TABLE schema_migrations")
    ));
    assert_eq!(
        db.calls[1..],
        [
            Call::Begin,
            Call::Claim(5),
            Call::Execute("CREATE TABLE users (id int);\n".to_string()),
            Call::Commit,
        ]
    );
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let temp_dir = setup_dir().await;
    write(temp_dir.path(), "5-add_users.sql", "CREATE TABLE users (id int);\n");

    let mut engine = new_engine(temp_dir.path(), MemoryDatabase::default());
    engine.migrate().await.unwrap();
    let mut db = engine.into_database();
    db.calls.clear();

    let mut engine = new_engine(temp_dir.path(), db);
    let result = engine.migrate().await.unwrap();
    assert!(!result.has_changes());
    assert!(engine.database().calls.is_empty());
}

#[tokio::test]
async fn test_only_unapplied_migrations_run() {
    let temp_dir = setup_dir().await;
    write(temp_dir.path(), "5-add_users.sql", "CREATE TABLE users (id int);\n");

    let db = MemoryDatabase {
        ledger: Some(BTreeMap::from([(0, "init".to_string())])),
        ..Default::default()
    };

    let mut engine = new_engine(temp_dir.path(), db);
    let result = engine.migrate().await.unwrap();
    assert_eq!(result.applied_migrations, vec!["5-add_users.sql"]);
    assert_eq!(engine.database().ledger_ids(), vec![0, 5]);
}

#[tokio::test]
async fn test_leading_zeros_do_not_change_order() {
    let temp_dir = setup_dir().await;
    write(temp_dir.path(), "20-b.sql", "SELECT 'b';\n");
    write(temp_dir.path(), "003-a.sql", "SELECT 'a';\n");

    let mut engine = new_engine(temp_dir.path(), MemoryDatabase::default());
    let result = engine.migrate().await.unwrap();
    assert_eq!(
        result.applied_migrations,
        vec!["0-init.sql", "003-a.sql", "20-b.sql"]
    );
}

#[tokio::test]
async fn test_no_transaction_file_claims_itself() {
    let temp_dir = setup_dir().await;
    write(
        temp_dir.path(),
        "7-index.sql",
        "--drift:no-transaction\n\
         CREATE INDEX CONCURRENTLY users_id ON users (id);\n\
         SELECT _drift_claim_migration(7, 'index');\n",
    );

    let mut engine = new_engine(temp_dir.path(), MemoryDatabase::default());
    engine.migrate().await.unwrap();

    let db = engine.into_database();
    assert_eq!(db.ledger_ids(), vec![0, 7]);
    assert!(!db.calls.contains(&Call::Begin));
    assert!(!db.calls.iter().any(|c| matches!(c, Call::Claim(_))));
}

#[tokio::test]
async fn test_failed_body_leaves_no_ledger_row_and_stops() {
    let temp_dir = setup_dir().await;
    write(temp_dir.path(), "1-broken.sql", "SELECT boom;\n");
    write(temp_dir.path(), "2-later.sql", "SELECT 2;\n");

    let mut engine = new_engine(temp_dir.path(), MemoryDatabase::default());
    let err = engine.migrate().await.unwrap_err();

    assert!(matches!(
        &err,
        MigrationError::Execution { migration, .. } if migration == "1-broken.sql"
    ));
    assert!(err.to_string().contains("boom"));

    let db = engine.into_database();
    assert_eq!(db.ledger_ids(), vec![0]);
    assert_eq!(db.calls.last(), Some(&Call::Rollback));
    assert!(!db.calls.contains(&Call::Execute("SELECT 2;\n".to_string())));
}

#[tokio::test]
async fn test_claim_conflict_rolls_back() {
    let temp_dir = setup_dir().await;
    write(temp_dir.path(), "3-racy.sql", "SELECT 3;\n");

    // Another process claimed 3 after this one read the ledger.
    let mut db = MemoryDatabase {
        ledger: Some(BTreeMap::from([(3, "racy".to_string())])),
        ..Default::default()
    };
    let file = MigrationFileManager::new(temp_dir.path())
        .list_migrations()
        .await
        .unwrap()
        .into_iter()
        .find(|f| f.name == "3-racy.sql")
        .unwrap();

    let err = apply_migration(&mut db, &file).await.unwrap_err();
    assert!(err.to_string().contains("duplicate key"));
    assert_eq!(db.calls, vec![Call::Begin, Call::Claim(3), Call::Rollback]);
    assert_eq!(db.ledger_ids(), vec![3]);
}

#[tokio::test]
async fn test_upto_ceiling_is_inclusive() {
    let temp_dir = setup_dir().await;
    write(temp_dir.path(), "1-a.sql", "SELECT 1;\n");
    write(temp_dir.path(), "2-b.sql", "SELECT 2;\n");
    write(temp_dir.path(), "3-c.sql", "SELECT 3;\n");

    let mut engine = new_engine_upto(temp_dir.path(), 2);
    let result = engine.migrate().await.unwrap();

    assert_eq!(result.applied_migrations, vec!["0-init.sql", "1-a.sql", "2-b.sql"]);
    assert_eq!(result.skipped_migrations, vec!["3-c.sql"]);
    assert_eq!(engine.database().ledger_ids(), vec![0, 1, 2]);
}

#[tokio::test]
async fn test_interrupt_stops_before_next_migration() {
    let temp_dir = setup_dir().await;
    write(temp_dir.path(), "1-a.sql", "SELECT 1;\n");

    let mut engine = new_engine(temp_dir.path(), MemoryDatabase::default());
    let interrupted = AtomicBool::new(true);
    let err = engine
        .migrate_until_interrupted(&interrupted)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::Interrupted { applied: 0 }));
    assert!(engine.database().calls.is_empty());
}

#[tokio::test]
async fn test_interrupt_during_migration_keeps_committed_work() {
    let temp_dir = setup_dir().await;
    write(temp_dir.path(), "1-a.sql", "SELECT 1;\n");
    write(temp_dir.path(), "2-b.sql", "SELECT 2;\n");

    let interrupted = Arc::new(AtomicBool::new(false));
    let db = MemoryDatabase {
        ledger: Some(BTreeMap::from([(0, "init".to_string())])),
        interrupt_on_commit: Some(interrupted.clone()),
        ..Default::default()
    };

    let mut engine = new_engine(temp_dir.path(), db);
    let err = engine
        .migrate_until_interrupted(&interrupted)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::Interrupted { applied: 1 }));
    let db = engine.into_database();
    assert_eq!(db.ledger_ids(), vec![0, 1]);
    assert_eq!(
        db.calls,
        vec![
            Call::Begin,
            Call::Claim(1),
            Call::Execute("SELECT 1;\n".to_string()),
            Call::Commit,
        ]
    );
}

#[tokio::test]
async fn test_status_reports_pending_and_missing() {
    let temp_dir = setup_dir().await;
    write(temp_dir.path(), "5-add_users.sql", "SELECT 5;\n");

    let db = MemoryDatabase {
        ledger: Some(BTreeMap::from([
            (0, "init".to_string()),
            (4, "deleted".to_string()),
        ])),
        ..Default::default()
    };

    let mut engine = new_engine(temp_dir.path(), db);
    let status = engine.status().await.unwrap();

    let pending: Vec<&str> = status.pending.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(pending, vec!["5-add_users.sql"]);
    assert_eq!(status.applied.len(), 2);
    assert_eq!(status.missing.len(), 1);
    assert_eq!(status.missing[0].slug, "deleted");
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut engine = new_engine(&temp_dir.path().join("nope"), MemoryDatabase::default());
    assert!(matches!(
        engine.migrate().await.unwrap_err(),
        MigrationError::Filesystem { .. }
    ));
}
