//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use drift_migrate::MigrationId;

/// Default verbosity: informational messages.
pub const DEFAULT_VERBOSITY: u8 = 1;

/// drift - Manage SQL migrations
#[derive(Parser, Debug)]
#[command(name = "drift")]
#[command(version)]
#[command(about = "drift - Manage SQL migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Options shared by every command
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Directory containing migration files
    #[arg(long, global = true, env = "DRIFT_MIGRATIONS_DIR")]
    pub migrations_dir: Option<PathBuf>,

    /// Config file (default: drift.toml in the current directory, if present)
    #[arg(long, global = true, env = "DRIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Resolve verbosity: 0 = errors only, 1 = info, 2+ = debug.
    ///
    /// Flags win over the config file value.
    pub fn verbosity(&self, configured: Option<u8>) -> u8 {
        if self.quiet {
            0
        } else if self.verbose > 0 {
            DEFAULT_VERBOSITY.saturating_add(self.verbose)
        } else {
            configured.unwrap_or(DEFAULT_VERBOSITY)
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Set up the migrations directory with the bootstrap migration
    #[command(alias = "init")]
    Setup,

    /// Run migrations
    Migrate(MigrateArgs),

    /// Create a new migration file
    New(NewArgs),

    /// Renumber migrations to fix filesystem sorting
    #[command(long_about = RENUMBER_LONG_ABOUT)]
    Renumber(RenumberArgs),

    /// Print the embedded default migration template
    MigrationTemplate,

    /// Show which migrations are applied and which are pending
    Status(StatusArgs),

    /// Display version information
    Version,
}

const RENUMBER_LONG_ABOUT: &str = "\
Renumber migrations to fix filesystem sorting.

Renames migration files so that string sorting matches the numeric sorting of
the IDs, by adding or removing leading zeros so every ID has the width of the
widest one.

Other commands ignore leading zeros when interpreting IDs, so renumbering is
never necessary for correctness. Without --write the renames are only printed.";

/// Database connection options
#[derive(Args, Debug)]
pub struct DatabaseArgs {
    /// Database connection URL
    #[arg(long, env = "DRIFT_DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

/// Arguments for the `migrate` command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Maximum migration ID to run (default: run all migrations)
    #[arg(long, value_name = "ID")]
    pub upto: Option<MigrationId>,
}

/// Arguments for the `new` command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Short text used to name the migration
    #[arg(long)]
    pub slug: String,

    /// Migration ID override (default: Unix timestamp in seconds)
    #[arg(long)]
    pub id: Option<MigrationId>,

    /// Template file for the migration
    #[arg(long, env = "DRIFT_TEMPLATE_FILE")]
    pub template: Option<PathBuf>,
}

/// Arguments for the `renumber` command
#[derive(Args, Debug)]
pub struct RenumberArgs {
    /// Execute renames instead of just printing them
    #[arg(short, long)]
    pub write: bool,
}

/// Arguments for the `status` command
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_new() {
        let cli =
            Cli::try_parse_from(["drift", "new", "--slug", "add users", "--id", "0"]).unwrap();
        match cli.command {
            Command::New(args) => {
                assert_eq!(args.slug, "add users");
                assert_eq!(args.id, Some(MigrationId::INIT));
            }
            other => panic!("expected new, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_id_rejected() {
        assert!(Cli::try_parse_from(["drift", "new", "--slug", "x", "--id", "-4"]).is_err());
        assert!(Cli::try_parse_from(["drift", "migrate", "--upto", "-1"]).is_err());
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["drift", "renumber"]).unwrap();
        assert_eq!(cli.global.verbosity(None), DEFAULT_VERBOSITY);
        assert_eq!(cli.global.verbosity(Some(2)), 2);

        let cli = Cli::try_parse_from(["drift", "-vv", "renumber"]).unwrap();
        assert_eq!(cli.global.verbosity(Some(0)), 3);

        let cli = Cli::try_parse_from(["drift", "renumber", "--quiet"]).unwrap();
        assert_eq!(cli.global.verbosity(Some(2)), 0);
    }

    #[test]
    fn test_init_alias() {
        let cli = Cli::try_parse_from(["drift", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Setup));
    }
}
