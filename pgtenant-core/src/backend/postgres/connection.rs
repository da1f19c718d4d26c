//! Administrative pool construction and per-database connections.

use super::PostgresBackend;
use crate::Result;
use crate::backend::ConnectionConfig;
use crate::error::{PgTenantError, ServerError, redact_database_url};
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::{Connection, Executor, PgPool};

/// Session settings applied to every administrative and scoped connection.
pub(crate) fn session_settings(config: &ConnectionConfig) -> Vec<String> {
    vec![
        format!(
            "SET statement_timeout = '{}ms'",
            config.statement_timeout.as_millis()
        ),
        format!("SET lock_timeout = '{}ms'", config.lock_timeout.as_millis()),
        format!(
            "SET application_name = 'pgtenant-{}'",
            env!("CARGO_PKG_VERSION")
        ),
    ]
}

impl PostgresBackend {
    /// Creates the administrative connection pool.
    ///
    /// The pool connects lazily, so an unreachable server surfaces on the
    /// first operation rather than here.
    ///
    /// # Connection Pool Configuration
    /// - Max connections: from config (default 4, capped at 100)
    /// - Acquire timeout: `connect_timeout`
    /// - Session settings: applied to every new connection via after_connect
    pub(crate) fn create_connection_pool(
        connection_string: &str,
        config: &ConnectionConfig,
    ) -> Result<PgPool> {
        let settings = session_settings(config);

        PgPoolOptions::new()
            .max_connections(config.max_connections.min(100))
            .acquire_timeout(config.connect_timeout)
            .test_before_acquire(true)
            .after_connect(move |conn, _meta| {
                let settings = settings.clone();
                Box::pin(async move {
                    for setting in &settings {
                        conn.execute(setting.as_str()).await?;
                    }
                    Ok(())
                })
            })
            .connect_lazy(connection_string)
            .map_err(|e| {
                PgTenantError::connection_failed(
                    format!(
                        "Failed to create PostgreSQL connection pool to {}",
                        redact_database_url(connection_string)
                    ),
                    e,
                )
            })
    }

    /// Opens a single connection to `database` with the pool's credentials.
    ///
    /// Gives up after `connect_timeout`. The caller owns the connection and
    /// must close it.
    pub(crate) async fn open_connection(&self, database: &str) -> Result<PgConnection> {
        let options = (*self.pool.connect_options()).clone().database(database);
        let timeout = self.config.connect_timeout;

        let mut conn = match tokio::time::timeout(timeout, PgConnection::connect_with(&options))
            .await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return Err(PgTenantError::connection_failed(
                    format!("failed to connect to {}", database),
                    e,
                ));
            }
            Err(_) => {
                return Err(PgTenantError::connection_failed(
                    format!("failed to connect to {}", database),
                    ServerError::new(format!("timed out after {}ms", timeout.as_millis())),
                ));
            }
        };

        for setting in session_settings(&self.config) {
            if let Err(e) = conn.execute(setting.as_str()).await {
                let _ = conn.close().await;
                return Err(PgTenantError::connection_failed(
                    format!("failed to configure session on {}", database),
                    e,
                ));
            }
        }

        Ok(conn)
    }
}
