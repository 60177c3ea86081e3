//! `drift migration-template` command - Print the default template.

use drift_migrate::DEFAULT_TEMPLATE;

use crate::error::CliResult;
use crate::output;

/// Run the migration-template command
pub async fn run() -> CliResult<()> {
    output::print(DEFAULT_TEMPLATE.trim());
    Ok(())
}
