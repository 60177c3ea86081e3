//! Templates for new migration files.

use minijinja::{Environment, context};

use crate::error::{MigrateResult, MigrationError};
use crate::id::MigrationId;

/// Source of the embedded default template.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/new.sql");

/// A validated migration template.
///
/// Templates are minijinja source rendered with two variables: `id` (the
/// integer migration ID) and `slug` (the normalized slug).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTemplate {
    source: String,
}

impl MigrationTemplate {
    /// Parse a template, failing on syntax errors.
    pub fn new(source: impl Into<String>) -> MigrateResult<Self> {
        let source = source.into();
        environment()
            .template_from_str(&source)
            .map_err(|e| MigrationError::template(e.to_string()))?;
        Ok(Self { source })
    }

    /// Load and parse a template file.
    pub async fn load(path: impl AsRef<std::path::Path>) -> MigrateResult<Self> {
        let path = path.as_ref();
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MigrationError::filesystem(path, e))?;
        Self::new(source)
    }

    /// Get the template source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the template for a migration.
    pub fn render(&self, id: MigrationId, slug: &str) -> MigrateResult<String> {
        environment()
            .render_str(&self.source, context! { id => id.get(), slug => slug })
            .map_err(|e| MigrationError::template(e.to_string()))
    }
}

impl Default for MigrationTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env
}
