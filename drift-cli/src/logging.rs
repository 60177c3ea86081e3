//! Tracing subscriber setup.
//!
//! `DRIFT_LOG` takes an `EnvFilter` directive and overrides the verbosity
//! flags. `DRIFT_LOG_FORMAT` selects `compact` (default), `pretty` or `json`.
//! Logs always go to stderr.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

const CRATES: &[&str] = &["drift", "drift_cli", "drift_migrate", "drift_postgres"];

/// Level name for a verbosity count.
pub fn level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "info",
        _ => "debug",
    }
}

/// Filter directives enabling `level` for every drift crate.
pub fn directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
pub fn init(verbosity: u8) {
    let filter = std::env::var("DRIFT_LOG")
        .ok()
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(directives(level(verbosity))));

    let format = std::env::var("DRIFT_LOG_FORMAT").unwrap_or_else(|_| "compact".into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi())
        .with_target(false);

    match format.as_str() {
        "pretty" => builder.pretty().init(),
        "json" => builder.json().init(),
        _ => builder.compact().without_time().init(),
    }
}

/// Color log lines only on a terminal, and never when `NO_COLOR` is set.
fn use_ansi() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}
