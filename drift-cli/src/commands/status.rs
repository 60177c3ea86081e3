//! `drift status` command - Show applied and pending migrations.

use std::path::Path;

use drift_migrate::{MigrationConfig, MigrationEngine};

use crate::cli::StatusArgs;
use crate::config::Config;
use crate::error::CliResult;
use crate::output;

/// Run the status command
pub async fn run(args: StatusArgs, config: &Config, migrations_dir: &Path) -> CliResult<()> {
    let db = super::connect(args.database, config).await?;
    let engine_config = MigrationConfig::new().migrations_dir(migrations_dir);
    let mut engine = MigrationEngine::new(engine_config, db);
    let status = engine.status().await?;

    output::section("Migrations");
    for (i, record) in status.applied.iter().enumerate() {
        let label = if status.missing.contains(record) {
            output::style_error("✗ Applied, file missing")
        } else {
            output::style_success("✓ Applied")
        };
        output::numbered_item(
            i + 1,
            &format!(
                "{}-{} - {} ({})",
                record.id,
                record.slug,
                label,
                record.run_at.format("%Y-%m-%d %H:%M:%S")
            ),
        );
    }
    for (i, file) in status.pending.iter().enumerate() {
        output::numbered_item(
            status.applied.len() + i + 1,
            &format!("{} - {}", file.name, output::style_pending("○ Pending")),
        );
    }

    output::newline();
    output::kv("Applied", &status.applied.len().to_string());
    output::kv("Pending", &status.pending.len().to_string());
    if !status.missing.is_empty() {
        output::kv("Missing files", &status.missing.len().to_string());
    }
    Ok(())
}
