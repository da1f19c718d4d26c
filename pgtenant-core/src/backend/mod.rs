//! Server access used by the privilege and ownership operations.
//!
//! The operations only need a narrow slice of the server: existence checks,
//! statement execution on the administrative connection, and short-lived
//! connections to a specific database. [`AdminBackend`] is that slice;
//! [`PostgresBackend`] implements it over `sqlx`.

mod config;

#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
pub(crate) mod mock;

pub use config::ConnectionConfig;

#[cfg(feature = "postgresql")]
pub use postgres::PostgresBackend;

use crate::Result;
use crate::error::ServerError;
use async_trait::async_trait;

/// Administrative access to a database server.
#[async_trait]
pub trait AdminBackend: Send + Sync {
    /// Whether a database with this exact name exists.
    async fn database_exists(&self, name: &str) -> Result<bool>;

    /// Whether a role with this exact name exists.
    async fn user_exists(&self, name: &str) -> Result<bool>;

    /// Executes one statement on the administrative connection.
    async fn execute(&self, sql: &str) -> std::result::Result<(), ServerError>;

    /// Opens a connection scoped to `database`.
    ///
    /// The caller must `close` the returned session when done.
    async fn connect_to(&self, database: &str) -> Result<Box<dyn DatabaseSession>>;

    /// Current owner of `database`.
    async fn database_owner(&self, database: &str) -> Result<String>;

    /// Current owner of the public schema inside `database`.
    async fn public_schema_owner(&self, database: &str) -> Result<String>;
}

/// A connection to one specific database.
#[async_trait]
pub trait DatabaseSession: Send {
    /// Executes one statement on this connection.
    async fn execute(&mut self, sql: &str) -> std::result::Result<(), ServerError>;

    /// Releases the connection. Further calls to `execute` fail.
    async fn close(&mut self);
}
