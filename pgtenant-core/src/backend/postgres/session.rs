//! Connection scoped to one database.

use crate::backend::DatabaseSession;
use crate::error::ServerError;
use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::{Connection, Executor};

/// A dedicated connection to one database, outside the administrative pool.
pub struct PostgresSession {
    database: String,
    conn: Option<PgConnection>,
}

impl PostgresSession {
    pub(crate) fn new(database: &str, conn: PgConnection) -> Self {
        Self {
            database: database.to_string(),
            conn: Some(conn),
        }
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

impl std::fmt::Debug for PostgresSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSession")
            .field("database", &self.database)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl DatabaseSession for PostgresSession {
    async fn execute(&mut self, sql: &str) -> Result<(), ServerError> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(ServerError::new(format!(
                "session to {} is closed",
                self.database
            )));
        };

        conn.execute(sql).await.map(|_| ()).map_err(ServerError::from)
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take()
            && let Err(e) = conn.close().await
        {
            tracing::warn!(
                database = %self.database,
                error = %e,
                "Database session did not close cleanly"
            );
        }
    }
}
