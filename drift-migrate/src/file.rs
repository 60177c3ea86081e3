//! Migration file discovery, naming, and creation.
//!
//! Migration files live flat in one directory and are named
//! `<digits>-<slug>.sql`:
//!
//! ```text
//! migrations/
//! ├── 0000000000-init.sql
//! ├── 1700000000-create_users.sql
//! └── 1700000450-add_user_email_index.sql
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex_lite::Regex;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{MigrateResult, MigrationError};
use crate::history::INIT_SQL;
use crate::id::MigrationId;
use crate::template::MigrationTemplate;

/// Line that opts a migration out of the wrapping transaction and the
/// automatic claim.
pub const NO_TRANSACTION_DIRECTIVE: &str = "--drift:no-transaction";

/// Slug of the bootstrap migration written by `setup`.
pub const INIT_SLUG: &str = "init";

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(.*)\.sql$").expect("filename pattern is valid"));

// Runs of characters commonly typed as word separators on a command line.
static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\-\s._/]+").expect("separator pattern is valid"));

/// A migration file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Path to the migration file.
    pub path: PathBuf,
    /// File name, e.g. `0005-add_users.sql`.
    pub name: String,
    /// Migration ID (parsed from the numeric prefix).
    pub id: MigrationId,
    /// Human readable label between the first `-` and `.sql`.
    pub slug: String,
    /// Raw SQL, executed verbatim.
    pub content: String,
    /// Numeric prefix exactly as written, leading zeros included.
    id_raw: String,
}

impl MigrationFile {
    /// Build a migration file from a path and its contents.
    ///
    /// Returns `Ok(None)` when the file name does not follow the migration
    /// naming convention.
    pub fn parse(
        path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> MigrateResult<Option<Self>> {
        let path = path.into();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            return Ok(None);
        };
        let Some((id, slug, id_raw)) = parse_filename(&name)? else {
            return Ok(None);
        };

        Ok(Some(Self {
            path,
            name,
            id,
            slug,
            content: content.into(),
            id_raw,
        }))
    }

    /// Width of the numeric prefix as it appears in the file name.
    pub fn original_width(&self) -> usize {
        self.id_raw.len()
    }

    /// Whether this migration runs inside a transaction with an automatic
    /// claim.
    pub fn is_transactional(&self) -> bool {
        !has_no_transaction_directive(&self.content)
    }
}

/// Split a file name into `(id, slug, raw id digits)`.
///
/// Returns `Ok(None)` for names that are not migrations and an error when the
/// numeric prefix does not fit in an `i64`.
pub fn parse_filename(name: &str) -> MigrateResult<Option<(MigrationId, String, String)>> {
    let Some(caps) = FILENAME_RE.captures(name) else {
        return Ok(None);
    };
    let id_raw = caps[1].to_string();
    let id = id_raw.parse::<MigrationId>()?;
    Ok(Some((id, caps[2].to_string(), id_raw)))
}

/// Format a migration file name with the ID zero-padded to `width`.
pub fn filename(width: usize, id: MigrationId, slug: &str) -> String {
    format!("{:0width$}-{}.sql", id.get(), slug, width = width)
}

/// The narrowest ID width that fits every migration (at least 1).
pub fn id_width(files: &[MigrationFile]) -> usize {
    files.iter().map(|f| f.id.width()).max().unwrap_or(1)
}

/// Collapse separator runs (whitespace, `-`, `.`, `_`, `/`) into single
/// underscores.
pub fn slugify(s: &str) -> String {
    SEPARATOR_RE.replace_all(s, "_").into_owned()
}

/// Whether the content carries the no-transaction directive on a line of its
/// own.
pub fn has_no_transaction_directive(content: &str) -> bool {
    content
        .lines()
        .any(|line| line.trim() == NO_TRANSACTION_DIRECTIVE)
}

/// Migration file reader/writer.
#[derive(Debug, Clone)]
pub struct MigrationFileManager {
    /// Directory where migrations are stored.
    migrations_dir: PathBuf,
}

impl MigrationFileManager {
    /// Create a new file manager.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    /// Get the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Ensure the migrations directory exists.
    pub async fn ensure_dir(&self) -> MigrateResult<()> {
        tokio::fs::create_dir_all(&self.migrations_dir)
            .await
            .map_err(|e| MigrationError::filesystem(&self.migrations_dir, e))
    }

    /// List every migration file in the directory, ordered by file name.
    ///
    /// Files that do not match the naming convention are skipped. Fails if
    /// two files parse to the same ID.
    pub async fn list_migrations(&self) -> MigrateResult<Vec<MigrationFile>> {
        let dir = &self.migrations_dir;
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| MigrationError::filesystem(dir, e))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MigrationError::filesystem(dir, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| MigrationError::filesystem(&path, e))?;
            if file_type.is_dir() {
                debug!(path = %path.display(), "Ignoring directory");
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        let mut migrations: Vec<MigrationFile> = Vec::new();
        let mut seen: HashMap<MigrationId, usize> = HashMap::new();
        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
                debug!(file = %path.display(), "Ignoring file with a non-UTF-8 name");
                continue;
            };
            if parse_filename(&name)?.is_none() {
                debug!(file = %name, "Ignoring non-migration file");
                continue;
            }

            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| MigrationError::filesystem(&path, e))?;
            let Some(migration) = MigrationFile::parse(path, content)? else {
                continue;
            };

            if let Some(&index) = seen.get(&migration.id) {
                return Err(MigrationError::duplicate_id(
                    migration.id,
                    &migrations[index].name,
                    &migration.name,
                ));
            }
            seen.insert(migration.id, migrations.len());
            migrations.push(migration);
        }

        Ok(migrations)
    }

    /// Create the migrations directory and the bootstrap migration.
    pub async fn setup(&self) -> MigrateResult<PathBuf> {
        self.ensure_dir().await?;

        let existing = self.list_migrations().await?;
        if let Some(f) = existing.iter().find(|f| f.id == MigrationId::INIT) {
            return Err(MigrationError::duplicate_id(
                MigrationId::INIT,
                &f.name,
                filename(1, MigrationId::INIT, INIT_SLUG),
            ));
        }

        let path = self
            .migrations_dir
            .join(filename(1, MigrationId::INIT, INIT_SLUG));
        write_new_file(&path, INIT_SQL).await?;
        info!(path = %path.display(), "Created bootstrap migration");
        Ok(path)
    }

    /// Create a new migration file from a template.
    ///
    /// The ID defaults to the current Unix time in seconds. The file name is
    /// padded to the width of the existing migrations so that adding a file
    /// never changes how the others sort.
    pub async fn create_migration(
        &self,
        id: Option<MigrationId>,
        slug: &str,
        template: &MigrationTemplate,
    ) -> MigrateResult<PathBuf> {
        let id = match id {
            Some(id) => id,
            None => MigrationId::now()?,
        };

        let existing = self.list_migrations().await?;
        let slug = slugify(slug);
        let name = filename(id_width(&existing), id, &slug);
        if let Some(f) = existing.iter().find(|f| f.id == id) {
            return Err(MigrationError::duplicate_id(id, &f.name, name));
        }

        let content = template.render(id, &slug)?;
        let path = self.migrations_dir.join(&name);
        write_new_file(&path, &content).await?;
        info!(path = %path.display(), "Created migration file");
        Ok(path)
    }
}

/// Write a file, failing if anything already exists at `path`.
async fn write_new_file(path: &Path, content: &str) -> MigrateResult<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| MigrationError::filesystem(path, e))?;
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| MigrationError::filesystem(path, e))?;
    file.flush()
        .await
        .map_err(|e| MigrationError::filesystem(path, e))?;
    Ok(())
}
