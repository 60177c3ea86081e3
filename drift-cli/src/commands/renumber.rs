//! `drift renumber` command - Normalize ID widths in file names.

use std::path::Path;

use drift_migrate::{MigrationFileManager, RenumberPlan};

use crate::cli::RenumberArgs;
use crate::error::CliResult;
use crate::output::{self, success, warn};

/// Run the renumber command
pub async fn run(args: RenumberArgs, migrations_dir: &Path) -> CliResult<()> {
    let files = MigrationFileManager::new(migrations_dir)
        .list_migrations()
        .await?;
    let plan = RenumberPlan::new(&files);

    if plan.is_empty() {
        output::info("Nothing to do.");
        return Ok(());
    }

    output::section("Renames:");
    let rows: Vec<(String, String)> = plan
        .renames
        .iter()
        .map(|r| (r.from.clone(), r.to.clone()))
        .collect();
    output::rename_table(&rows);

    if !args.write {
        warn("Skipping renames because --write is off");
        return Ok(());
    }

    plan.apply(migrations_dir).await?;
    success(&format!("Renamed {} file(s)", plan.renames.len()));
    Ok(())
}
