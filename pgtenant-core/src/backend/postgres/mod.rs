//! PostgreSQL backend over `sqlx`.
//!
//! # Module Structure
//! - `connection`: administrative pool and per-database connections
//! - `session`: the `DatabaseSession` used for database-local statements
//!
//! # Security Guarantees
//! - Connection strings are sanitized in error messages and `Debug` output
//! - Statement and lock timeouts are set on every session
//! - Lookups bind names as parameters; no name is spliced into a query

mod connection;
mod session;


pub use session::PostgresSession;

use crate::backend::{AdminBackend, ConnectionConfig, DatabaseSession};
use crate::error::{PgTenantError, ServerError};
use crate::privileges::PUBLIC_SCHEMA;
use crate::Result;
use async_trait::async_trait;
use sqlx::{Connection, Executor, PgPool};

/// Administrative access to a PostgreSQL server.
pub struct PostgresBackend {
    pool: PgPool,
    config: ConnectionConfig,
}

impl std::fmt::Debug for PostgresBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresBackend")
            .field("config", &self.config)
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish()
    }
}

impl PostgresBackend {
    /// Creates a backend from a connection URL.
    ///
    /// # Arguments
    /// * `connection_string` - PostgreSQL connection URL (credentials sanitized in errors)
    ///
    /// # Errors
    /// Returns error if:
    /// - Connection string format is invalid
    /// - Pool configuration is invalid
    #[allow(clippy::unused_async)]
    pub async fn new(connection_string: &str) -> Result<Self> {
        let config = ConnectionConfig::from_url(connection_string)?;
        let pool = Self::create_connection_pool(connection_string, &config)?;
        Ok(Self { pool, config })
    }

    /// Creates a backend with an explicit configuration.
    ///
    /// Host, port, database and username are taken from `connection_string`
    /// and replace the ones in `config`, which supplies timeouts and pool
    /// limits.
    #[allow(clippy::unused_async)]
    pub async fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        let location = ConnectionConfig::from_url(connection_string)?;
        let config = ConnectionConfig {
            host: location.host,
            port: location.port,
            database: location.database,
            username: location.username,
            ..config
        };
        config.validate()?;
        let pool = Self::create_connection_pool(connection_string, &config)?;
        Ok(Self { pool, config })
    }

    /// Configuration the pool was built with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Administrative pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Closes the administrative pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl AdminBackend for PostgresBackend {
    async fn database_exists(&self, name: &str) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PgTenantError::statement("checking database existence", e.into()))
    }

    async fn user_exists(&self, name: &str) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_roles WHERE rolname = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PgTenantError::statement("checking user existence", e.into()))
    }

    async fn execute(&self, sql: &str) -> std::result::Result<(), ServerError> {
        self.pool
            .execute(sql)
            .await
            .map(|_| ())
            .map_err(ServerError::from)
    }

    async fn connect_to(&self, database: &str) -> Result<Box<dyn DatabaseSession>> {
        let conn = self.open_connection(database).await?;
        tracing::debug!(database, "Opened database session");
        Ok(Box::new(PostgresSession::new(database, conn)))
    }

    async fn database_owner(&self, database: &str) -> Result<String> {
        let owner: Option<String> = sqlx::query_scalar(
            "SELECT pg_get_userbyid(datdba)::text FROM pg_database WHERE datname = $1",
        )
        .bind(database)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PgTenantError::statement("reading database owner", e.into()))?;

        owner.ok_or_else(|| PgTenantError::DatabaseNotFound {
            database: database.to_string(),
        })
    }

    async fn public_schema_owner(&self, database: &str) -> Result<String> {
        let mut conn = self.open_connection(database).await?;

        let owner: std::result::Result<Option<String>, sqlx::Error> = sqlx::query_scalar(
            "SELECT pg_get_userbyid(nspowner)::text FROM pg_namespace WHERE nspname = $1",
        )
        .bind(PUBLIC_SCHEMA)
        .fetch_optional(&mut conn)
        .await;

        if let Err(e) = conn.close().await {
            tracing::warn!(database, error = %e, "Database session did not close cleanly");
        }

        owner
            .map_err(|e| PgTenantError::statement("reading public schema owner", e.into()))?
            .ok_or_else(|| {
                PgTenantError::statement(
                    "reading public schema owner",
                    ServerError::new(format!("schema {} does not exist", PUBLIC_SCHEMA)),
                )
            })
    }
}
