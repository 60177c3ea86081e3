//! drift CLI - Manage SQL migrations.

use clap::Parser;

use drift_cli::cli::{Cli, Command};
use drift_cli::commands;
use drift_cli::config::Config;
use drift_cli::error::CliResult;
use drift_cli::{logging, output};

#[tokio::main]
async fn main() {
    // Run the CLI and handle errors
    if let Err(e) = run().await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let config = Config::discover(cli.global.config.as_deref(), &cwd)?;
    let verbosity = cli.global.verbosity(config.verbosity);
    logging::init(verbosity);
    output::set_quiet(verbosity == 0);

    let migrations_dir = config.migrations_dir(cli.global.migrations_dir.clone());

    match cli.command {
        Command::Setup => commands::setup::run(&migrations_dir).await,
        Command::Migrate(args) => commands::migrate::run(args, &config, &migrations_dir).await,
        Command::New(args) => commands::new::run(args, &config, &migrations_dir).await,
        Command::Renumber(args) => commands::renumber::run(args, &migrations_dir).await,
        Command::MigrationTemplate => commands::template::run().await,
        Command::Status(args) => commands::status::run(args, &config, &migrations_dir).await,
        Command::Version => commands::version::run().await,
    }
}
