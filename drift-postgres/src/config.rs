//! PostgreSQL connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PgError, PgResult};

/// Application name reported to the server unless the URL sets one.
pub const DEFAULT_APPLICATION_NAME: &str = "drift";

/// TLS negotiation, named after libpq's `sslmode` values.
///
/// `Prefer` and `Require` encrypt without checking the server certificate.
/// `VerifyCa` checks the chain against `sslrootcert`, and `VerifyFull` also
/// checks that the certificate matches the host name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Plain text only.
    Disable,
    /// Try TLS, fall back to plain text.
    #[default]
    Prefer,
    /// TLS, any server certificate.
    Require,
    /// TLS, certificate signed by a trusted root.
    VerifyCa,
    /// TLS, trusted certificate issued for the host.
    VerifyFull,
}

impl SslMode {
    fn parse(value: &str) -> PgResult<Self> {
        match value {
            "disable" => Ok(Self::Disable),
            "allow" | "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            other => Err(PgError::config(format!("invalid sslmode: {}", other))),
        }
    }

    /// Whether the server certificate is checked against trusted roots.
    pub fn verifies_certificate(self) -> bool {
        matches!(self, Self::VerifyCa | Self::VerifyFull)
    }

    fn to_pg(self) -> tokio_postgres::config::SslMode {
        use tokio_postgres::config::SslMode as Pg;
        match self {
            Self::Disable => Pg::Disable,
            Self::Prefer => Pg::Prefer,
            Self::Require | Self::VerifyCa | Self::VerifyFull => Pg::Require,
        }
    }
}

/// PostgreSQL connection configuration.
#[derive(Debug, Clone)]
pub struct PgConfig {
    /// Host (default: localhost).
    pub host: String,
    /// Port (default: 5432).
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Username.
    pub user: String,
    /// Password.
    pub password: Option<String>,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Statement timeout applied to the whole session.
    pub statement_timeout: Option<Duration>,
    /// Application name (shown in pg_stat_activity).
    pub application_name: String,
    /// TLS negotiation mode.
    pub ssl_mode: SslMode,
    /// PEM file with trusted root certificates.
    pub ssl_root_cert: Option<PathBuf>,
}

impl PgConfig {
    /// Create a new configuration from a database URL.
    pub fn from_url(url: &str) -> PgResult<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| PgError::config(format!("invalid database URL: {}", e)))?;

        if parsed.scheme() != "postgresql" && parsed.scheme() != "postgres" {
            return Err(PgError::config(format!(
                "invalid scheme: expected 'postgresql' or 'postgres', got '{}'",
                parsed.scheme()
            )));
        }

        let host = parsed.host_str().unwrap_or("localhost").to_string();
        let port = parsed.port().unwrap_or(5432);

        let database = parsed.path().trim_start_matches('/').to_string();
        if database.is_empty() {
            return Err(PgError::config("missing database name in URL"));
        }

        let user = if parsed.username().is_empty() {
            "postgres".to_string()
        } else {
            parsed.username().to_string()
        };

        let password = parsed.password().map(String::from);

        let mut connect_timeout = Duration::from_secs(30);
        let mut statement_timeout = None;
        let mut application_name = DEFAULT_APPLICATION_NAME.to_string();
        let mut ssl_mode = SslMode::default();
        let mut ssl_root_cert = None;

        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "sslmode" => ssl_mode = SslMode::parse(&value)?,
                "sslrootcert" => ssl_root_cert = Some(PathBuf::from(value.as_ref())),
                "connect_timeout" => {
                    let secs: u64 = value
                        .parse()
                        .map_err(|_| PgError::config("invalid connect_timeout"))?;
                    connect_timeout = Duration::from_secs(secs);
                }
                "statement_timeout" => {
                    let ms: u64 = value
                        .parse()
                        .map_err(|_| PgError::config("invalid statement_timeout"))?;
                    statement_timeout = Some(Duration::from_millis(ms));
                }
                "application_name" => {
                    application_name = value.into_owned();
                }
                other => {
                    return Err(PgError::config(format!("unknown URL parameter: {}", other)));
                }
            }
        }

        if ssl_mode.verifies_certificate() && ssl_root_cert.is_none() {
            return Err(PgError::config(format!(
                "sslmode={} needs sslrootcert to name the trusted root certificates",
                if ssl_mode == SslMode::VerifyCa { "verify-ca" } else { "verify-full" }
            )));
        }

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
            connect_timeout,
            statement_timeout,
            application_name,
            ssl_mode,
            ssl_root_cert,
        })
    }

    /// Convert to tokio-postgres config.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config.host(&self.host);
        config.port(self.port);
        config.dbname(&self.database);
        config.user(&self.user);

        if let Some(ref password) = self.password {
            config.password(password);
        }

        config.application_name(&self.application_name);
        config.connect_timeout(self.connect_timeout);
        config.ssl_mode(self.ssl_mode.to_pg());

        if let Some(timeout) = self.statement_timeout {
            config.options(&format!("-c statement_timeout={}", timeout.as_millis()));
        }

        config
    }
}
