//! `drift version` command - Display version information.

use crate::error::CliResult;
use crate::output::{self, kv};

/// Package version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the version command
pub async fn run() -> CliResult<()> {
    output::section("drift");

    kv("Version", VERSION);
    kv("Binary", "drift");

    #[cfg(debug_assertions)]
    let build_mode = "debug";
    #[cfg(not(debug_assertions))]
    let build_mode = "release";

    kv("Build", build_mode);
    kv("Database", "postgresql");

    output::newline();
    output::dim("Migrations apply in ascending ID order; see `drift --help`.");
    Ok(())
}
