//! The standard privilege bundle: connect, schema usage/create, and all
//! privileges on existing and future tables and sequences.

use super::plan::{Action, GrantTarget, Statement};
use crate::manager::PrivilegeManager;
use crate::{AdminBackend, PgTenantError, Result};
use tracing::info;

/// One row of the bundle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleStep {
    /// Object class the step applies to
    pub target: GrantTarget,
    /// Keyword list applied to that target
    pub privileges: &'static str,
}

const fn step(target: GrantTarget, privileges: &'static str) -> BundleStep {
    BundleStep { target, privileges }
}

/// Statements issued by `grant_all`, in order.
pub const GRANT_ALL_STEPS: &[BundleStep] = &[
    step(GrantTarget::Database, "CONNECT"),
    step(GrantTarget::Schema, "USAGE, CREATE"),
    step(GrantTarget::ExistingTables, "ALL PRIVILEGES"),
    step(GrantTarget::ExistingSequences, "ALL PRIVILEGES"),
    step(GrantTarget::FutureTables, "ALL PRIVILEGES"),
    step(GrantTarget::FutureSequences, "ALL PRIVILEGES"),
];

/// Statements issued by `revoke_all`, in order.
pub const REVOKE_ALL_STEPS: &[BundleStep] = &[
    step(GrantTarget::Database, "CONNECT"),
    step(GrantTarget::ExistingTables, "ALL PRIVILEGES"),
    step(GrantTarget::ExistingSequences, "ALL PRIVILEGES"),
    step(GrantTarget::Schema, "USAGE, CREATE"),
    step(GrantTarget::FutureTables, "ALL PRIVILEGES"),
    step(GrantTarget::FutureSequences, "ALL PRIVILEGES"),
];

fn render(steps: &[BundleStep], action: Action, database: &str, username: &str) -> Vec<Statement> {
    steps
        .iter()
        .map(|step| step.target.statement(action, step.privileges, database, username))
        .collect()
}

impl<B: AdminBackend> PrivilegeManager<B> {
    /// Applies the full standard bundle for `username` on `database`.
    ///
    /// The role is checked before the database, and both must exist before
    /// any grant is issued. A failing step stops the operation; steps that
    /// already ran stay applied.
    ///
    /// # Errors
    /// - `InvalidIdentifier` for empty or reserved names
    /// - `UserNotFound` / `DatabaseNotFound` when a precondition fails
    /// - `Statement` naming the failed step
    pub async fn grant_all(&self, database: &str, username: &str) -> Result<()> {
        self.policy().validate_database_name(database)?;
        self.policy().validate_username(username)?;

        if !self.backend().user_exists(username).await? {
            return Err(PgTenantError::UserNotFound {
                username: username.to_string(),
            });
        }
        if !self.backend().database_exists(database).await? {
            return Err(PgTenantError::DatabaseNotFound {
                database: database.to_string(),
            });
        }

        info!(database, username, "Granting privilege bundle");
        let statements = render(GRANT_ALL_STEPS, Action::Grant, database, username);
        self.run(database, &statements).await?;
        info!(database, username, "Privilege bundle granted");
        Ok(())
    }

    /// Removes the standard bundle for `username` on `database`.
    ///
    /// No existence checks are made: revoking something that was never
    /// granted is a no-op on the server. Only the role's own grants are
    /// removed; anything it holds through `PUBLIC` (new databases grant
    /// CONNECT to `PUBLIC`) is untouched, so the role may still connect.
    pub async fn revoke_all(&self, database: &str, username: &str) -> Result<()> {
        self.policy().validate_database_name(database)?;
        self.policy().validate_username(username)?;

        info!(database, username, "Revoking privilege bundle");
        let statements = render(REVOKE_ALL_STEPS, Action::Revoke, database, username);
        self.run(database, &statements).await?;
        info!(database, username, "Privilege bundle revoked");
        Ok(())
    }
}
