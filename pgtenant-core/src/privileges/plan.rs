//! Grant targets and the statements they render to.

use crate::validation::quote_identifier;
use serde::Serialize;

/// Schema that tenant objects live in.
pub const PUBLIC_SCHEMA: &str = "public";

/// Direction of a privilege change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Add the privilege
    Grant,
    /// Remove the privilege
    Revoke,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Self::Grant => "GRANT",
            Self::Revoke => "REVOKE",
        }
    }

    fn preposition(self) -> &'static str {
        match self {
            Self::Grant => "TO",
            Self::Revoke => "FROM",
        }
    }

    fn gerund(self) -> &'static str {
        match self {
            Self::Grant => "granting",
            Self::Revoke => "revoking",
        }
    }
}

/// Connection a statement has to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementScope {
    /// The administrative connection; used for database-level statements
    Server,
    /// A connection to the target database; schema, object and default
    /// privileges are local to a database
    Database,
}

/// Object class a privilege is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantTarget {
    /// The database itself
    Database,
    /// The public schema
    Schema,
    /// Tables that exist now
    ExistingTables,
    /// Sequences that exist now
    ExistingSequences,
    /// Functions and procedures that exist now
    ExistingRoutines,
    /// Tables created later, via default privileges
    FutureTables,
    /// Sequences created later, via default privileges
    FutureSequences,
    /// Routines created later, via default privileges
    FutureRoutines,
}

/// Ordered targets for one privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantPlan {
    /// Targets touched by a grant, in execution order
    pub grant: &'static [GrantTarget],
    /// Targets touched by a revoke, in execution order
    pub revoke: &'static [GrantTarget],
}

impl GrantPlan {
    /// Targets for the given direction.
    pub fn targets(&self, action: Action) -> &'static [GrantTarget] {
        match action {
            Action::Grant => self.grant,
            Action::Revoke => self.revoke,
        }
    }
}

/// One statement of an operation, with the step name used in errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// What the statement does, e.g. "granting SELECT on existing tables"
    pub step: String,
    /// Connection the statement must run on
    pub scope: StatementScope,
    /// SQL text
    pub sql: String,
}

impl GrantTarget {
    /// Connection this target's statements run on.
    pub fn scope(self) -> StatementScope {
        match self {
            Self::Database => StatementScope::Server,
            _ => StatementScope::Database,
        }
    }

    /// True for default-privilege targets.
    pub fn is_future(self) -> bool {
        matches!(
            self,
            Self::FutureTables | Self::FutureSequences | Self::FutureRoutines
        )
    }

    /// Human readable object description used in step names.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Database => "on database",
            Self::Schema => "on schema public",
            Self::ExistingTables => "on existing tables",
            Self::ExistingSequences => "on existing sequences",
            Self::ExistingRoutines => "on existing routines",
            Self::FutureTables => "on future tables",
            Self::FutureSequences => "on future sequences",
            Self::FutureRoutines => "on future routines",
        }
    }

    /// Renders the statement applying `privileges` for `role`.
    ///
    /// `privileges` is a keyword list such as `SELECT` or `USAGE, CREATE`;
    /// it always comes from the static catalog or bundle tables, never from
    /// caller input. Identifiers are quoted.
    pub fn statement(
        self,
        action: Action,
        privileges: &str,
        database: &str,
        role: &str,
    ) -> Statement {
        let verb = action.verb();
        let preposition = action.preposition();
        let role = quote_identifier(role);
        let schema = quote_identifier(PUBLIC_SCHEMA);

        let sql = match self {
            Self::Database => format!(
                "{} {} ON DATABASE {} {} {}",
                verb,
                privileges,
                quote_identifier(database),
                preposition,
                role
            ),
            Self::Schema => format!(
                "{} {} ON SCHEMA {} {} {}",
                verb, privileges, schema, preposition, role
            ),
            Self::ExistingTables | Self::ExistingSequences | Self::ExistingRoutines => format!(
                "{} {} ON ALL {} IN SCHEMA {} {} {}",
                verb,
                privileges,
                self.object_class(),
                schema,
                preposition,
                role
            ),
            Self::FutureTables | Self::FutureSequences | Self::FutureRoutines => format!(
                "ALTER DEFAULT PRIVILEGES IN SCHEMA {} {} {} ON {} {} {}",
                schema,
                verb,
                privileges,
                self.object_class(),
                preposition,
                role
            ),
        };

        Statement {
            step: format!("{} {} {}", action.gerund(), privileges, self.describe()),
            scope: self.scope(),
            sql,
        }
    }

    fn object_class(self) -> &'static str {
        match self {
            Self::ExistingTables | Self::FutureTables => "TABLES",
            Self::ExistingSequences | Self::FutureSequences => "SEQUENCES",
            Self::ExistingRoutines | Self::FutureRoutines => "ROUTINES",
            Self::Database => "DATABASE",
            Self::Schema => "SCHEMA",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_database_statement() {
        let stmt = GrantTarget::Database.statement(Action::Grant, "CONNECT", "tenant", "alice");

        assert_eq!(stmt.sql, r#"GRANT CONNECT ON DATABASE "tenant" TO "alice""#);
        assert_eq!(stmt.scope, StatementScope::Server);
        assert_eq!(stmt.step, "granting CONNECT on database");
    }

    #[test]
    fn test_revoke_uses_from() {
        let stmt = GrantTarget::Schema.statement(Action::Revoke, "USAGE", "tenant", "alice");

        assert_eq!(stmt.sql, r#"REVOKE USAGE ON SCHEMA "public" FROM "alice""#);
        assert_eq!(stmt.scope, StatementScope::Database);
        assert_eq!(stmt.step, "revoking USAGE on schema public");
    }

    #[test]
    fn test_existing_objects_statement() {
        let stmt =
            GrantTarget::ExistingRoutines.statement(Action::Grant, "EXECUTE", "tenant", "alice");
        assert_eq!(
            stmt.sql,
            r#"GRANT EXECUTE ON ALL ROUTINES IN SCHEMA "public" TO "alice""#
        );

        let stmt = GrantTarget::ExistingSequences.statement(
            Action::Revoke,
            "ALL PRIVILEGES",
            "tenant",
            "alice",
        );
        assert_eq!(
            stmt.sql,
            r#"REVOKE ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA "public" FROM "alice""#
        );
    }

    #[test]
    fn test_default_privileges_statement() {
        let stmt = GrantTarget::FutureTables.statement(Action::Grant, "SELECT", "tenant", "alice");
        assert_eq!(
            stmt.sql,
            r#"ALTER DEFAULT PRIVILEGES IN SCHEMA "public" GRANT SELECT ON TABLES TO "alice""#
        );
        assert_eq!(stmt.step, "granting SELECT on future tables");

        let stmt =
            GrantTarget::FutureRoutines.statement(Action::Revoke, "EXECUTE", "tenant", "alice");
        assert_eq!(
            stmt.sql,
            r#"ALTER DEFAULT PRIVILEGES IN SCHEMA "public" REVOKE EXECUTE ON ROUTINES FROM "alice""#
        );
    }

    #[test]
    fn test_identifiers_are_quoted() {
        let stmt = GrantTarget::Database.statement(
            Action::Grant,
            "CONNECT",
            "db\"; DROP DATABASE x; --",
            "bob\"",
        );
        assert_eq!(
            stmt.sql,
            r#"GRANT CONNECT ON DATABASE "db""; DROP DATABASE x; --" TO "bob""""#
        );
    }

    #[test]
    fn test_scopes() {
        assert_eq!(GrantTarget::Database.scope(), StatementScope::Server);
        for target in [
            GrantTarget::Schema,
            GrantTarget::ExistingTables,
            GrantTarget::ExistingSequences,
            GrantTarget::ExistingRoutines,
            GrantTarget::FutureTables,
            GrantTarget::FutureSequences,
            GrantTarget::FutureRoutines,
        ] {
            assert_eq!(target.scope(), StatementScope::Database, "{:?}", target);
        }
    }
}
