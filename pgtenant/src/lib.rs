//! Library module for the pgtenant binary
//!
//! Argument parsing, connection URL handling and command dispatch live here
//! so they can be tested without a server. `main.rs` only wires logging and
//! the exit code.

use clap::{Args, Parser, Subcommand};
use pgtenant_core::error::redact_database_url;
use pgtenant_core::privileges::{GrantTarget, Privilege};
use pgtenant_core::{IdentifierPolicy, PgTenantError, PostgresBackend, PrivilegeManager, Result};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;
use zeroize::Zeroizing;

#[derive(Parser, Debug)]
#[command(name = "pgtenant")]
#[command(about = "Grant, revoke and hand over ownership of PostgreSQL tenant databases")]
#[command(version)]
#[command(long_about = "
pgtenant - privilege and ownership management for PostgreSQL tenants

Grants and revokes a fixed catalog of privileges for a tenant role on a
tenant database, including default privileges for objects created later,
and transfers database and public schema ownership.

None of the multi-statement operations are transactional. When a step
fails, earlier steps stay applied and the error names the failed step.

EXAMPLES:
  pgtenant --database-url postgres://admin@localhost/postgres -W grant SELECT tenant_db tenant_app
  pgtenant grant-all tenant_db tenant_app
  pgtenant transfer-schema tenant_db tenant_owner
  pgtenant privileges --json
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, help = "Only log errors; command output is still printed")]
    pub quiet: bool,

    /// Administrative connection URL
    #[arg(
        long,
        env = "DATABASE_URL",
        global = true,
        help = "Administrative connection string (credentials are sanitized in logs)"
    )]
    pub database_url: Option<String>,

    /// Prompt for the password instead of reading it from the URL
    #[arg(short = 'W', long, global = true)]
    pub password: bool,

    /// Extra reserved role names, refused as grant and revoke targets
    #[arg(long = "reserved-user", value_name = "NAME", global = true)]
    pub reserved_users: Vec<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Grant one privilege to a role on a database
    Grant(PrivilegeArgs),
    /// Revoke one privilege from a role on a database
    Revoke(PrivilegeArgs),
    /// Grant the standard privilege bundle
    GrantAll(RoleArgs),
    /// Revoke the standard privilege bundle
    RevokeAll(RoleArgs),
    /// Make a role the owner of a database
    TransferDatabase(OwnerArgs),
    /// Make a role the owner of a database's public schema
    TransferSchema(OwnerArgs),
    /// Show the owners of a database and its public schema
    Owner(DatabaseArgs),
    /// List the supported privileges and what each one covers
    Privileges(CatalogArgs),
}

#[derive(Args, Debug, PartialEq, Eq)]
pub struct PrivilegeArgs {
    /// Privilege name (case-insensitive)
    pub privilege: String,
    /// Target database
    pub database: String,
    /// Role receiving or losing the privilege
    pub username: String,
}

#[derive(Args, Debug, PartialEq, Eq)]
pub struct RoleArgs {
    /// Target database
    pub database: String,
    /// Role receiving or losing the bundle
    pub username: String,
}

#[derive(Args, Debug, PartialEq, Eq)]
pub struct OwnerArgs {
    /// Target database
    pub database: String,
    /// New owner role
    pub owner: String,
}

#[derive(Args, Debug, PartialEq, Eq)]
pub struct DatabaseArgs {
    /// Database to inspect
    pub database: String,
}

#[derive(Args, Debug, PartialEq, Eq)]
pub struct CatalogArgs {
    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}

/// One catalog row as printed by the `privileges` command.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CatalogRow {
    pub privilege: Privilege,
    pub grant: Vec<&'static str>,
    pub revoke: Vec<&'static str>,
    pub default_privileges: bool,
}

fn describe(targets: &[GrantTarget]) -> Vec<&'static str> {
    targets.iter().map(|target| target.describe()).collect()
}

/// Builds the catalog listing in catalog order.
pub fn catalog_rows() -> Vec<CatalogRow> {
    Privilege::ALL
        .into_iter()
        .map(|privilege| CatalogRow {
            privilege,
            grant: describe(privilege.plan().grant),
            revoke: describe(privilege.plan().revoke),
            default_privileges: privilege.requires_default_privileges(),
        })
        .collect()
}

/// Renders the catalog listing as aligned text or pretty JSON.
pub fn render_catalog(json: bool) -> Result<String> {
    let rows = catalog_rows();
    if json {
        return serde_json::to_string_pretty(&rows).map_err(|e| {
            PgTenantError::configuration(format!("Failed to serialize privilege catalog: {}", e))
        });
    }

    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "{:<11} {}{}\n",
            row.privilege.keyword(),
            row.grant.join(", "),
            if row.default_privileges { "" } else { " (no default privileges)" }
        ));
    }
    Ok(out)
}

/// Replaces the password in `database_url`.
///
/// The returned URL is wiped from memory on drop.
pub fn with_password(database_url: &str, password: &str) -> Result<Zeroizing<String>> {
    let mut url = Url::parse(database_url).map_err(|e| {
        PgTenantError::configuration(format!("Invalid PostgreSQL connection string format: {}", e))
    })?;
    url.set_password(Some(password)).map_err(|()| {
        PgTenantError::configuration("Connection string cannot carry a password")
    })?;
    Ok(Zeroizing::new(url.to_string()))
}

/// Resolves the administrative connection URL, prompting for the password
/// when `-W` is given.
pub fn resolve_database_url(global: &GlobalArgs) -> Result<Zeroizing<String>> {
    let database_url = global.database_url.as_deref().ok_or_else(|| {
        PgTenantError::configuration("Database URL is required (--database-url or DATABASE_URL)")
    })?;

    if !global.password {
        return Ok(Zeroizing::new(database_url.to_string()));
    }

    let password = Zeroizing::new(rpassword::prompt_password("Password: ").map_err(|e| {
        PgTenantError::configuration(format!("Failed to read password: {}", e))
    })?);
    with_password(database_url, &password)
}

/// Identifier policy with the default reserved names plus any
/// `--reserved-user` values.
pub fn identifier_policy(global: &GlobalArgs) -> IdentifierPolicy {
    IdentifierPolicy::default().with_reserved_usernames(global.reserved_users.iter().cloned())
}

/// Runs the parsed command and returns what should be printed on stdout.
pub async fn run(cli: &Cli) -> Result<String> {
    if let Command::Privileges(args) = &cli.command {
        return render_catalog(args.json);
    }

    let database_url = resolve_database_url(&cli.global)?;
    info!("Target: {}", redact_database_url(&database_url));

    let backend = PostgresBackend::new(&database_url).await?;
    let manager = PrivilegeManager::with_policy(backend, identifier_policy(&cli.global));
    debug!(policy = ?manager.policy(), "Manager ready");

    let outcome = dispatch(&manager, &cli.command).await;
    manager.backend().close().await;
    outcome
}

async fn dispatch(
    manager: &PrivilegeManager<PostgresBackend>,
    command: &Command,
) -> Result<String> {
    match command {
        Command::Grant(args) => {
            manager
                .grant(&args.privilege, &args.database, &args.username)
                .await?;
            Ok(format!(
                "Granted {} on {} to {}\n",
                args.privilege.trim().to_uppercase(),
                args.database,
                args.username
            ))
        }
        Command::Revoke(args) => {
            manager
                .revoke(&args.privilege, &args.database, &args.username)
                .await?;
            Ok(format!(
                "Revoked {} on {} from {}\n",
                args.privilege.trim().to_uppercase(),
                args.database,
                args.username
            ))
        }
        Command::GrantAll(args) => {
            manager.grant_all(&args.database, &args.username).await?;
            Ok(format!(
                "Granted privilege bundle on {} to {}\n",
                args.database, args.username
            ))
        }
        Command::RevokeAll(args) => {
            manager.revoke_all(&args.database, &args.username).await?;
            Ok(format!(
                "Revoked privilege bundle on {} from {}\n",
                args.database, args.username
            ))
        }
        Command::TransferDatabase(args) => {
            manager
                .transfer_database_ownership(&args.database, &args.owner)
                .await?;
            Ok(format!("Database {} now owned by {}\n", args.database, args.owner))
        }
        Command::TransferSchema(args) => {
            manager
                .transfer_public_schema_ownership(&args.database, &args.owner)
                .await?;
            Ok(format!(
                "Schema public in {} now owned by {}\n",
                args.database, args.owner
            ))
        }
        Command::Owner(args) => {
            let database_owner = manager.database_owner(&args.database).await?;
            let schema_owner = manager.public_schema_owner(&args.database).await?;
            Ok(format!(
                "database: {}\npublic schema: {}\n",
                database_owner, schema_owner
            ))
        }
        Command::Privileges(args) => render_catalog(args.json),
    }
}
