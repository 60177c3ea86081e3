//! CLI command implementations.

pub mod migrate;
pub mod new;
pub mod renumber;
pub mod setup;
pub mod status;
pub mod template;
pub mod version;

use drift_postgres::PgDatabase;

use crate::cli::DatabaseArgs;
use crate::config::Config;
use crate::error::CliResult;

/// Open the database connection for commands that need one.
async fn connect(args: DatabaseArgs, config: &Config) -> CliResult<PgDatabase> {
    let url = config.database_url(args.database_url)?;
    Ok(PgDatabase::connect(&url).await?)
}
