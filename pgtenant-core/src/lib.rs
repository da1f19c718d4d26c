//! Privilege management and ownership transfer for PostgreSQL tenants.
//!
//! This crate grants and revokes database, schema, table, sequence and
//! routine privileges for tenant roles, including default privileges for
//! objects created later, and hands database and schema ownership over to
//! new roles.
//!
//! # Guarantees
//! - Privilege names are checked against a closed catalog before any
//!   statement is issued
//! - Identifiers are always quoted; reserved names are refused
//! - Credentials are never logged or included in errors
//!
//! # Caveats
//! - Multi-statement operations are not atomic. A failure part way through
//!   leaves earlier statements applied, and the error names the failed step.
//! - The crate is write-only with respect to privileges: it does not read
//!   back what a role can effectively do.
//!
//! # Architecture
//! - [`PrivilegeManager`] is the entry point; it is generic over an
//!   [`AdminBackend`] so the statement sequencing is testable without a server
//! - [`privileges`] holds the catalog as data: privilege to ordered targets
//! - [`PostgresBackend`] is the `sqlx` implementation

pub mod backend;
pub mod error;
pub mod logging;
pub mod manager;
mod ownership;
pub mod privileges;
pub mod validation;

// Re-export commonly used types
pub use backend::{AdminBackend, ConnectionConfig, DatabaseSession};
pub use error::{IdentifierKind, PgTenantError, Result, ServerError};
pub use logging::init_logging;
pub use manager::PrivilegeManager;
pub use privileges::{GrantTarget, Privilege, validate_privilege};
pub use validation::IdentifierPolicy;

#[cfg(feature = "postgresql")]
pub use backend::PostgresBackend;
