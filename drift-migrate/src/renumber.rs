//! Renumbering migration files so string order matches numeric order.
//!
//! IDs are compared as integers everywhere else, so renumbering is never
//! needed for correctness. It only keeps `ls` output in application order.

use std::path::Path;

use tracing::info;

use crate::error::{MigrateResult, MigrationError};
use crate::file::{MigrationFile, filename, id_width};

/// A single proposed file rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    /// Current file name.
    pub from: String,
    /// File name with the ID padded to the common width.
    pub to: String,
}

/// The set of renames that would normalize ID widths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenumberPlan {
    /// Width every ID is padded to.
    pub width: usize,
    /// Files whose prefix width differs from `width`.
    pub renames: Vec<Rename>,
}

impl RenumberPlan {
    /// Compute renames for every file whose prefix is not `width` digits.
    pub fn new(files: &[MigrationFile]) -> Self {
        let width = id_width(files);
        let renames = files
            .iter()
            .filter(|f| f.original_width() != width)
            .map(|f| Rename {
                from: f.name.clone(),
                to: filename(width, f.id, &f.slug),
            })
            .collect();
        Self { width, renames }
    }

    /// Check if there is nothing to rename.
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    /// Perform the renames inside `dir`.
    ///
    /// Refuses to overwrite an existing file. Renames performed before a
    /// failure are left in place.
    pub async fn apply(&self, dir: &Path) -> MigrateResult<()> {
        for rename in &self.renames {
            let from = dir.join(&rename.from);
            let to = dir.join(&rename.to);

            let exists = tokio::fs::try_exists(&to)
                .await
                .map_err(|e| MigrationError::filesystem(&to, e))?;
            if exists {
                return Err(MigrationError::filesystem(
                    &to,
                    std::io::Error::new(std::io::ErrorKind::AlreadyExists, "rename target exists"),
                ));
            }

            tokio::fs::rename(&from, &to)
                .await
                .map_err(|e| MigrationError::filesystem(&from, e))?;
            info!(from = %rename.from, to = %rename.to, "Renamed migration");
        }
        Ok(())
    }
}
