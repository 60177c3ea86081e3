//! Styled terminal output utilities.
//!
//! Status messages go to stderr; command results (paths, plans, templates)
//! go to stdout so they can be piped. Colors follow the stream's terminal
//! support and `NO_COLOR`.

use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::{OwoColorize, Stream};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress success, info and warning messages. Errors are always printed.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print a section header
pub fn section(text: &str) {
    println!("{}", text.if_supports_color(Stream::Stdout, |t| t.bold()));
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.if_supports_color(Stream::Stdout, |t| t.dimmed()), value);
}

/// Print a numbered list item
pub fn numbered_item(number: usize, text: &str) {
    let number = number.to_string();
    println!("  {}. {}", number.if_supports_color(Stream::Stdout, |t| t.dimmed()), text);
}

/// Print a two-column `old -> new` table
pub fn rename_table(rows: &[(String, String)]) {
    let width = rows.iter().map(|(from, _)| from.len()).max().unwrap_or(0);
    let arrow = "->".if_supports_color(Stream::Stdout, |t| t.dimmed());
    for (from, to) in rows {
        println!("  {:<width$} {} {}", from, arrow, to, width = width);
    }
}

/// Print plain text on stdout
pub fn print(text: &str) {
    println!("{}", text);
}

/// Print a newline
pub fn newline() {
    println!();
}

/// Print dimmed text
pub fn dim(text: &str) {
    println!("{}", text.if_supports_color(Stream::Stdout, |t| t.dimmed()));
}

/// Print a success message
pub fn success(text: &str) {
    if is_quiet() {
        return;
    }
    eprintln!(
        "{} {}",
        "✔".if_supports_color(Stream::Stderr, |t| t.green()),
        text.if_supports_color(Stream::Stderr, |t| t.green())
    );
}

/// Print an info message
pub fn info(text: &str) {
    if is_quiet() {
        return;
    }
    eprintln!("{} {}", "ℹ".if_supports_color(Stream::Stderr, |t| t.blue()), text);
}

/// Print a warning message
pub fn warn(text: &str) {
    if is_quiet() {
        return;
    }
    eprintln!(
        "{} {}",
        "⚠".if_supports_color(Stream::Stderr, |t| t.yellow()),
        text.if_supports_color(Stream::Stderr, |t| t.yellow())
    );
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!(
        "{} {}",
        "✖".if_supports_color(Stream::Stderr, |t| t.red()),
        text.if_supports_color(Stream::Stderr, |t| t.red())
    );
}

/// Style text as success (green)
pub fn style_success(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.green()).to_string()
}

/// Style text as pending (yellow)
pub fn style_pending(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.yellow()).to_string()
}

/// Style text as error (red)
pub fn style_error(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.red()).to_string()
}
