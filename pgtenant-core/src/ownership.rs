//! Database and public schema ownership transfer.
//!
//! Database ownership is cluster-wide and changes on the administrative
//! connection. Schema ownership is local to a database, so the public
//! schema transfer runs on a short-lived connection to that database which
//! is released whether or not the statement succeeds.

use crate::manager::PrivilegeManager;
use crate::privileges::{PUBLIC_SCHEMA, Statement, StatementScope};
use crate::validation::{quote_identifier, validate_role_reference};
use crate::{AdminBackend, Result};
use tracing::info;

fn database_owner_statement(database: &str, new_owner: &str) -> Statement {
    Statement {
        step: "transferring database ownership".to_string(),
        scope: StatementScope::Server,
        sql: format!(
            "ALTER DATABASE {} OWNER TO {}",
            quote_identifier(database),
            quote_identifier(new_owner)
        ),
    }
}

fn schema_owner_statement(new_owner: &str) -> Statement {
    Statement {
        step: "transferring public schema ownership".to_string(),
        scope: StatementScope::Database,
        sql: format!(
            "ALTER SCHEMA {} OWNER TO {}",
            quote_identifier(PUBLIC_SCHEMA),
            quote_identifier(new_owner)
        ),
    }
}

impl<B: AdminBackend> PrivilegeManager<B> {
    /// Makes `new_owner` the owner of `database`.
    ///
    /// No existence check is made; a missing role or database is reported
    /// by the server and returned as a `Statement` error.
    pub async fn transfer_database_ownership(&self, database: &str, new_owner: &str) -> Result<()> {
        self.policy().validate_database_name(database)?;
        validate_role_reference(new_owner)?;

        info!(database, new_owner, "Transferring database ownership");
        self.run(database, &[database_owner_statement(database, new_owner)]).await
    }

    /// Makes `new_owner` the owner of the public schema inside `database`.
    ///
    /// # Errors
    /// - `Connection` if the database-scoped connection cannot be opened
    /// - `Statement` if the server rejects the transfer
    pub async fn transfer_public_schema_ownership(
        &self,
        database: &str,
        new_owner: &str,
    ) -> Result<()> {
        self.policy().validate_database_name(database)?;
        validate_role_reference(new_owner)?;

        info!(database, new_owner, "Transferring public schema ownership");
        self.run(database, &[schema_owner_statement(new_owner)]).await
    }

    /// Current owner of `database`, as recorded by the server.
    pub async fn database_owner(&self, database: &str) -> Result<String> {
        self.policy().validate_database_name(database)?;
        self.backend().database_owner(database).await
    }

    /// Current owner of the public schema inside `database`.
    pub async fn public_schema_owner(&self, database: &str) -> Result<String> {
        self.policy().validate_database_name(database)?;
        self.backend().public_schema_owner(database).await
    }
}
