//! Migration identifiers.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{MigrateResult, MigrationError};

/// A nonnegative integer used to order and identify migrations.
///
/// New migrations default to a Unix timestamp in seconds, so the value is
/// stored as an `i64` for easy conversion to and from the database. Use
/// [`MigrationId::new`] to reject negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct MigrationId(i64);

impl MigrationId {
    /// The ID of the bootstrap migration.
    pub const INIT: MigrationId = MigrationId(0);

    /// Create a migration ID, rejecting negative values.
    pub fn new(value: i64) -> MigrateResult<Self> {
        if value < 0 {
            return Err(MigrationError::NegativeId(value));
        }
        Ok(Self(value))
    }

    /// An ID derived from the current wall-clock time in Unix seconds.
    pub fn now() -> MigrateResult<Self> {
        Self::new(Utc::now().timestamp())
    }

    /// Get the raw integer value.
    pub fn get(self) -> i64 {
        self.0
    }

    /// Number of decimal digits needed to print this ID.
    pub fn width(self) -> usize {
        let mut n = self.0;
        let mut digits = 1;
        while n >= 10 {
            n /= 10;
            digits += 1;
        }
        digits
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MigrationId {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|e| MigrationError::InvalidId(format!("{s:?}: {e}")))?;
        Self::new(value)
    }
}

impl TryFrom<i64> for MigrationId {
    type Error = MigrationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MigrationId> for i64 {
    fn from(id: MigrationId) -> Self {
        id.0
    }
}
