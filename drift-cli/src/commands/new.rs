//! `drift new` command - Create a migration file.

use std::path::Path;

use drift_migrate::{MigrationFileManager, MigrationTemplate};

use crate::cli::NewArgs;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the new command
pub async fn run(args: NewArgs, config: &Config, migrations_dir: &Path) -> CliResult<()> {
    let template = match config.template_file(args.template) {
        Some(path) => MigrationTemplate::load(&path).await?,
        None => MigrationTemplate::default(),
    };

    let path = MigrationFileManager::new(migrations_dir)
        .create_migration(args.id, &args.slug, &template)
        .await?;

    success(&format!("Created new migration file: {}", path.display()));
    output::print(&path.display().to_string());
    Ok(())
}
