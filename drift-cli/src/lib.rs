//! drift CLI - Command-line interface for the drift migration tool.
//!
//! This crate provides the `drift` binary: bootstrapping a migrations
//! directory, creating and renumbering migration files, and applying pending
//! migrations to PostgreSQL.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
