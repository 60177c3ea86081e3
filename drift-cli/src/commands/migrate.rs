//! `drift migrate` command - Apply pending migrations.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use drift_migrate::{MigrationConfig, MigrationEngine};

use crate::cli::MigrateArgs;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the migrate command
pub async fn run(args: MigrateArgs, config: &Config, migrations_dir: &Path) -> CliResult<()> {
    let db = super::connect(args.database, config).await?;

    let engine_config = MigrationConfig::new()
        .migrations_dir(migrations_dir)
        .upto(args.upto);
    let mut engine = MigrationEngine::new(engine_config, db);

    let interrupted = Arc::new(AtomicBool::new(false));
    watch_interrupts(interrupted.clone());

    let result = engine.migrate_until_interrupted(&interrupted).await?;

    if !result.skipped_migrations.is_empty() {
        output::info(&format!(
            "Left {} migration(s) above --upto unapplied",
            result.skipped_migrations.len()
        ));
    }
    success(&result.summary());
    Ok(())
}

/// The first Ctrl-C stops the run before the next migration starts; the
/// second exits immediately and leaves rollback to the server.
fn watch_interrupts(interrupted: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        interrupted.store(true, Ordering::SeqCst);
        output::warn(
            "Interrupt received, cleaning up before quitting. Interrupt again to force-quit.",
        );

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}
