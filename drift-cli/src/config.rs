//! CLI configuration handling.
//!
//! Settings come from, in order of precedence: command-line flags, `DRIFT_*`
//! environment variables (both handled by clap), the config file, and
//! built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "drift.toml";

/// Default migrations directory (relative to the working directory)
pub const MIGRATIONS_DIR: &str = "migrations";

/// drift configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory containing migration files
    pub migrations_dir: Option<PathBuf>,

    /// Database connection URL
    pub database_url: Option<String>,

    /// Template file for new migrations
    pub template_file: Option<PathBuf>,

    /// Log verbosity (0 = errors only, 1 = info, 2 = debug)
    pub verbosity: Option<u8>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the explicitly named config file, or `drift.toml` in `cwd` if it
    /// exists, or fall back to defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> CliResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let implicit = cwd.join(CONFIG_FILE_NAME);
        if implicit.is_file() {
            Self::load(&implicit)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the migrations directory
    pub fn migrations_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.migrations_dir.clone())
            .unwrap_or_else(|| PathBuf::from(MIGRATIONS_DIR))
    }

    /// Resolve the database URL, which is required for database commands
    pub fn database_url(&self, flag: Option<String>) -> CliResult<String> {
        flag.or_else(|| self.database_url.clone()).ok_or_else(|| {
            CliError::Config(format!(
                "no database URL: pass --database-url, set DRIFT_DATABASE_URL, or add database_url to {}",
                CONFIG_FILE_NAME
            ))
        })
    }

    /// Resolve the template file, if any
    pub fn template_file(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.template_file.clone())
    }
}
