//! Single-privilege grant and revoke.

use super::plan::{Action, Statement};
use super::{Privilege, validate_privilege};
use crate::manager::PrivilegeManager;
use crate::{AdminBackend, Result};
use tracing::info;

/// Renders the statements applying `privilege` in the given direction.
pub(crate) fn plan_statements(
    privilege: Privilege,
    action: Action,
    database: &str,
    username: &str,
) -> Vec<Statement> {
    privilege
        .plan()
        .targets(action)
        .iter()
        .map(|target| target.statement(action, privilege.keyword(), database, username))
        .collect()
}

impl<B: AdminBackend> PrivilegeManager<B> {
    /// Grants one privilege to `username` on `database`.
    ///
    /// The privilege name is case-insensitive. Depending on the privilege
    /// this issues one or two statements:
    ///
    /// | Privilege | Statements |
    /// |-----------|------------|
    /// | CONNECT, TEMPORARY | database grant |
    /// | USAGE | schema grant, default USAGE on future sequences |
    /// | CREATE | schema grant only |
    /// | EXECUTE | existing routines, default on future routines |
    /// | table privileges | existing tables, default on future tables |
    ///
    /// # Errors
    /// Validation errors are returned before any statement is issued.
    /// A `Statement` error means the statements before the failed step
    /// were applied.
    ///
    /// # Example
    /// ```rust,ignore
    /// manager.grant("select", "tenant_42", "app_reader").await?;
    /// ```
    pub async fn grant(&self, privilege: &str, database: &str, username: &str) -> Result<()> {
        self.apply(Action::Grant, privilege, database, username).await
    }

    /// Revokes one privilege from `username` on `database`.
    ///
    /// Statements are issued in the order existing objects, default
    /// privileges, schema grant. Revoking a privilege that was never granted
    /// succeeds, so a successful revoke says nothing about prior state.
    ///
    /// Only the role's own entries are removed. Revoking CONNECT leaves the
    /// default `PUBLIC` CONNECT grant in place, so the role can still connect
    /// unless that grant was revoked separately.
    pub async fn revoke(&self, privilege: &str, database: &str, username: &str) -> Result<()> {
        self.apply(Action::Revoke, privilege, database, username).await
    }

    async fn apply(
        &self,
        action: Action,
        privilege: &str,
        database: &str,
        username: &str,
    ) -> Result<()> {
        self.policy().validate_database_name(database)?;
        self.policy().validate_username(username)?;
        let privilege = validate_privilege(privilege)?;

        let statements = plan_statements(privilege, action, database, username);
        info!(
            %privilege,
            database,
            username,
            action = ?action,
            statements = statements.len(),
            "Applying privilege change"
        );
        self.run(database, &statements).await
    }
}
