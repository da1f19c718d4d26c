//! Identifier validation and quoting.
//!
//! Database and role names are checked against an [`IdentifierPolicy`]
//! before any statement that mentions them is built. The policy carries the
//! reserved names that tenant operations must never touch; it is a value
//! handed to the manager at construction, so two managers in one process can
//! run with different reserved sets.
//!
//! # Example
//! ```rust
//! use pgtenant_core::validation::{IdentifierPolicy, quote_identifier};
//!
//! let policy = IdentifierPolicy::default().with_reserved_usernames(["replicator"]);
//!
//! assert!(policy.validate_database_name("tenant_42").is_ok());
//! assert!(policy.validate_database_name("template1").is_err());
//! assert!(policy.validate_username("replicator").is_err());
//! assert_eq!(quote_identifier(r#"odd"name"#), r#""odd""name""#);
//! ```

use crate::Result;
use crate::error::{IdentifierKind, PgTenantError};
use std::collections::BTreeSet;

/// PostgreSQL silently truncates identifiers beyond NAMEDATALEN - 1 bytes.
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Databases that ship with every PostgreSQL cluster.
pub const DEFAULT_RESERVED_DATABASES: &[&str] = &["postgres", "template0", "template1"];

/// Roles that ship with every PostgreSQL cluster.
pub const DEFAULT_RESERVED_USERNAMES: &[&str] = &["postgres"];

/// Reserved identifiers that operations refuse to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierPolicy {
    reserved_databases: BTreeSet<String>,
    reserved_usernames: BTreeSet<String>,
}

impl Default for IdentifierPolicy {
    fn default() -> Self {
        Self {
            reserved_databases: DEFAULT_RESERVED_DATABASES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            reserved_usernames: DEFAULT_RESERVED_USERNAMES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }
}

impl IdentifierPolicy {
    /// Creates a policy with the cluster defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds database names to the reserved set.
    pub fn with_reserved_databases<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_databases
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds role names to the reserved set.
    pub fn with_reserved_usernames<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_usernames
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Reserved database names, sorted.
    pub fn reserved_databases(&self) -> impl Iterator<Item = &str> {
        self.reserved_databases.iter().map(String::as_str)
    }

    /// Reserved role names, sorted.
    pub fn reserved_usernames(&self) -> impl Iterator<Item = &str> {
        self.reserved_usernames.iter().map(String::as_str)
    }

    /// Rejects empty, reserved or malformed database names.
    pub fn validate_database_name(&self, name: &str) -> Result<()> {
        check_shape(IdentifierKind::Database, name)?;
        if self.reserved_databases.contains(name) {
            return Err(PgTenantError::invalid_identifier(
                IdentifierKind::Database,
                format!("{} is a disallowed database name", name),
            ));
        }
        Ok(())
    }

    /// Rejects empty, reserved or malformed role names.
    pub fn validate_username(&self, name: &str) -> Result<()> {
        check_shape(IdentifierKind::Username, name)?;
        if self.reserved_usernames.contains(name) {
            return Err(PgTenantError::invalid_identifier(
                IdentifierKind::Username,
                format!("username {} is reserved", name),
            ));
        }
        Ok(())
    }
}

/// Checks a role named as a new owner.
///
/// Reserved roles are accepted here: handing a database back to the
/// cluster superuser is a legitimate transfer.
pub fn validate_role_reference(name: &str) -> Result<()> {
    check_shape(IdentifierKind::Owner, name)
}

fn check_shape(kind: IdentifierKind, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PgTenantError::invalid_identifier(kind, "cannot be empty"));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(PgTenantError::invalid_identifier(
            kind,
            format!(
                "too long: maximum {} bytes, got {}",
                MAX_IDENTIFIER_LENGTH,
                name.len()
            ),
        ));
    }
    if name.contains('\0') {
        return Err(PgTenantError::invalid_identifier(
            kind,
            "contains a NUL character",
        ));
    }
    Ok(())
}

/// Quotes an identifier for inclusion in a statement.
///
/// Embedded double quotes are doubled, so the result is always a single
/// delimited identifier regardless of input.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
