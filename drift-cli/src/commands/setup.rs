//! `drift setup` command - Create the bootstrap migration.

use std::path::Path;

use drift_migrate::MigrationFileManager;

use crate::error::CliResult;
use crate::output::{self, success};

/// Run the setup command
pub async fn run(migrations_dir: &Path) -> CliResult<()> {
    let path = MigrationFileManager::new(migrations_dir).setup().await?;

    success(&format!("Created the first migration file: {}", path.display()));
    output::info("Run `drift migrate` to apply it.");
    Ok(())
}
