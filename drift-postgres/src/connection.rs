//! PostgreSQL database handle.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use drift_migrate::history::{CLAIM_FUNCTION, LEDGER_TABLE};
use drift_migrate::{MigrateResult, MigrationDatabase, MigrationId, MigrationRecord};
use tokio::task::JoinHandle;
use tokio_postgres::Client;
use tracing::{debug, error};

use crate::config::PgConfig;
use crate::error::{PgError, PgResult};
use crate::tls;

/// A single PostgreSQL connection used to run migrations.
pub struct PgDatabase {
    client: Client,
    connection: JoinHandle<()>,
}

impl PgDatabase {
    /// Connect using a database URL.
    pub async fn connect(url: &str) -> PgResult<Self> {
        Self::connect_with(&PgConfig::from_url(url)?).await
    }

    /// Connect using an explicit configuration.
    pub async fn connect_with(config: &PgConfig) -> PgResult<Self> {
        debug!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            sslmode = ?config.ssl_mode,
            "Connecting"
        );
        let connector = tls::connector(config).await?;
        let (client, connection) = config
            .to_pg_config()
            .connect(connector)
            .await
            .map_err(|e| PgError::connection(e.to_string()))?;

        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(Self { client, connection })
    }

    /// Get the underlying tokio-postgres client.
    ///
    /// This is useful for advanced operations not covered by this wrapper.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    async fn batch(&self, sql: &str) -> PgResult<()> {
        debug!(sql = %sql, "Executing batch");
        self.client.batch_execute(sql).await?;
        Ok(())
    }
}

impl Drop for PgDatabase {
    fn drop(&mut self) {
        self.connection.abort();
    }
}

#[async_trait]
impl MigrationDatabase for PgDatabase {
    async fn applied(&mut self) -> MigrateResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT id::bigint, slug, run_at FROM {} ORDER BY id ASC",
            LEDGER_TABLE
        );
        debug!(sql = %sql, "Reading ledger");
        let rows = self.client.query(&sql, &[]).await.map_err(PgError::from)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get(0).map_err(PgError::from)?;
            let run_at: NaiveDateTime = row.try_get(2).map_err(PgError::from)?;
            records.push(MigrationRecord {
                id: MigrationId::new(id)?,
                slug: row.try_get(1).map_err(PgError::from)?,
                run_at: run_at.and_utc(),
            });
        }
        Ok(records)
    }

    async fn execute(&mut self, sql: &str) -> MigrateResult<()> {
        Ok(self.batch(sql).await?)
    }

    async fn claim(&mut self, id: MigrationId, slug: &str) -> MigrateResult<()> {
        let sql = format!("SELECT {}($1, $2)", CLAIM_FUNCTION);
        debug!(id = %id, slug = %slug, "Claiming migration");
        self.client
            .execute(&sql, &[&id.get(), &slug])
            .await
            .map_err(PgError::from)?;
        Ok(())
    }

    async fn begin(&mut self) -> MigrateResult<()> {
        Ok(self.batch("BEGIN").await?)
    }

    async fn commit(&mut self) -> MigrateResult<()> {
        Ok(self.batch("COMMIT").await?)
    }

    async fn rollback(&mut self) -> MigrateResult<()> {
        Ok(self.batch("ROLLBACK").await?)
    }
}
