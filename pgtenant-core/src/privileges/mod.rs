//! Privilege catalog, target resolution and grant/revoke execution.
//!
//! # Module Structure
//! - `plan`: grant targets and statement rendering
//! - `executor`: single-privilege `grant` / `revoke`
//! - `bundle`: the standard bundle applied by `grant_all` / `revoke_all`
//!
//! The catalog is a static table: each supported privilege has one row
//! holding its server keyword and the ordered targets it fans out to. Grant
//! and revoke both read the same row, so supporting a new privilege means
//! adding a variant and a row, not new branches.
//!
//! # Partial application
//! None of the multi-statement operations run inside a transaction.
//! PostgreSQL applies each statement as it is issued; when a later statement
//! fails, the earlier ones stay in effect and the returned error names the
//! step that failed.

mod bundle;
mod executor;
mod plan;


pub use bundle::{BundleStep, GRANT_ALL_STEPS, REVOKE_ALL_STEPS};
pub use plan::{Action, GrantPlan, GrantTarget, PUBLIC_SCHEMA, Statement, StatementScope};

use crate::Result;
use crate::error::PgTenantError;
use serde::{Deserialize, Serialize};

/// A privilege from the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Privilege {
    /// SELECT on tables
    Select,
    /// INSERT on tables
    Insert,
    /// UPDATE on tables
    Update,
    /// DELETE on tables
    Delete,
    /// TRUNCATE on tables
    Truncate,
    /// REFERENCES on tables
    References,
    /// TRIGGER on tables
    Trigger,
    /// CONNECT on the database
    Connect,
    /// TEMPORARY on the database
    Temporary,
    /// EXECUTE on routines
    Execute,
    /// USAGE on the schema, plus sequences created later
    Usage,
    /// CREATE on the schema
    Create,
}

struct CatalogEntry {
    privilege: Privilege,
    keyword: &'static str,
    plan: GrantPlan,
}

const DATABASE_ONLY: GrantPlan = GrantPlan {
    grant: &[GrantTarget::Database],
    revoke: &[GrantTarget::Database],
};

const TABLES: GrantPlan = GrantPlan {
    grant: &[GrantTarget::ExistingTables, GrantTarget::FutureTables],
    revoke: &[GrantTarget::ExistingTables, GrantTarget::FutureTables],
};

const ROUTINES: GrantPlan = GrantPlan {
    grant: &[GrantTarget::ExistingRoutines, GrantTarget::FutureRoutines],
    revoke: &[GrantTarget::ExistingRoutines, GrantTarget::FutureRoutines],
};

const SCHEMA_USAGE: GrantPlan = GrantPlan {
    grant: &[GrantTarget::Schema, GrantTarget::FutureSequences],
    revoke: &[GrantTarget::FutureSequences, GrantTarget::Schema],
};

// No default-privilege entry: CREATE on the schema is not extended to
// objects created later.
const SCHEMA_CREATE: GrantPlan = GrantPlan {
    grant: &[GrantTarget::Schema],
    revoke: &[GrantTarget::Schema],
};

// Rows are in declaration order of `Privilege`.
static CATALOG: [CatalogEntry; 12] = [
    CatalogEntry {
        privilege: Privilege::Select,
        keyword: "SELECT",
        plan: TABLES,
    },
    CatalogEntry {
        privilege: Privilege::Insert,
        keyword: "INSERT",
        plan: TABLES,
    },
    CatalogEntry {
        privilege: Privilege::Update,
        keyword: "UPDATE",
        plan: TABLES,
    },
    CatalogEntry {
        privilege: Privilege::Delete,
        keyword: "DELETE",
        plan: TABLES,
    },
    CatalogEntry {
        privilege: Privilege::Truncate,
        keyword: "TRUNCATE",
        plan: TABLES,
    },
    CatalogEntry {
        privilege: Privilege::References,
        keyword: "REFERENCES",
        plan: TABLES,
    },
    CatalogEntry {
        privilege: Privilege::Trigger,
        keyword: "TRIGGER",
        plan: TABLES,
    },
    CatalogEntry {
        privilege: Privilege::Connect,
        keyword: "CONNECT",
        plan: DATABASE_ONLY,
    },
    CatalogEntry {
        privilege: Privilege::Temporary,
        keyword: "TEMPORARY",
        plan: DATABASE_ONLY,
    },
    CatalogEntry {
        privilege: Privilege::Execute,
        keyword: "EXECUTE",
        plan: ROUTINES,
    },
    CatalogEntry {
        privilege: Privilege::Usage,
        keyword: "USAGE",
        plan: SCHEMA_USAGE,
    },
    CatalogEntry {
        privilege: Privilege::Create,
        keyword: "CREATE",
        plan: SCHEMA_CREATE,
    },
];

impl Privilege {
    /// Every supported privilege, in catalog order.
    pub const ALL: [Privilege; 12] = [
        Privilege::Select,
        Privilege::Insert,
        Privilege::Update,
        Privilege::Delete,
        Privilege::Truncate,
        Privilege::References,
        Privilege::Trigger,
        Privilege::Connect,
        Privilege::Temporary,
        Privilege::Execute,
        Privilege::Usage,
        Privilege::Create,
    ];

    fn entry(self) -> &'static CatalogEntry {
        &CATALOG[self as usize]
    }

    /// Canonical server-side keyword.
    pub fn keyword(self) -> &'static str {
        self.entry().keyword
    }

    /// Ordered grant and revoke targets for this privilege.
    pub fn plan(self) -> &'static GrantPlan {
        &self.entry().plan
    }

    /// Whether granting this privilege also extends default privileges to
    /// objects created later.
    pub fn requires_default_privileges(self) -> bool {
        self.plan().grant.iter().any(|target| target.is_future())
    }
}

impl std::fmt::Display for Privilege {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

impl std::str::FromStr for Privilege {
    type Err = PgTenantError;

    fn from_str(s: &str) -> Result<Self> {
        validate_privilege(s)
    }
}

/// Resolves a privilege name against the catalog.
///
/// Names are case-insensitive and surrounding whitespace is ignored. This
/// check runs before any statement is issued.
///
/// # Example
/// ```rust
/// use pgtenant_core::privileges::{Privilege, validate_privilege};
///
/// assert_eq!(validate_privilege("select").unwrap(), Privilege::Select);
/// assert!(validate_privilege("DROP").is_err());
/// ```
pub fn validate_privilege(name: &str) -> Result<Privilege> {
    let normalized = name.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(PgTenantError::invalid_privilege(name));
    }

    CATALOG
        .iter()
        .find(|entry| entry.keyword == normalized)
        .map(|entry| entry.privilege)
        .ok_or_else(|| PgTenantError::invalid_privilege(name))
}
