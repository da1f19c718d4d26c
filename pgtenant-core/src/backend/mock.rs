//! Recording backend for unit tests.

use super::{AdminBackend, DatabaseSession};
use crate::Result;
use crate::error::{PgTenantError, ServerError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// One statement observed by the mock, with the database it ran in
/// (`None` for the administrative connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Executed {
    pub database: Option<String>,
    pub sql: String,
}

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub users: HashSet<String>,
    pub databases: HashSet<String>,
    pub executed: Vec<Executed>,
    pub existence_checks: usize,
    pub fail_containing: Option<String>,
    pub fail_connect: bool,
    pub sessions_opened: usize,
    pub sessions_closed: usize,
    pub database_owners: HashMap<String, String>,
    pub schema_owners: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, name: &str) -> Self {
        self.state().users.insert(name.to_string());
        self
    }

    pub fn with_database(self, name: &str) -> Self {
        self.state().databases.insert(name.to_string());
        self
    }

    /// Fails every statement whose SQL contains `fragment`.
    pub fn failing_on(self, fragment: &str) -> Self {
        self.state().fail_containing = Some(fragment.to_string());
        self
    }

    pub fn failing_connect(self) -> Self {
        self.state().fail_connect = true;
        self
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn statements(&self) -> Vec<String> {
        self.state().executed.iter().map(|e| e.sql.clone()).collect()
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.state().executed.clone()
    }

    fn record(&self, database: Option<&str>, sql: &str) -> std::result::Result<(), ServerError> {
        let mut state = self.state();
        if let Some(fragment) = &state.fail_containing
            && sql.contains(fragment.as_str())
        {
            return Err(
                ServerError::new(format!("mock failure on {}", fragment)).with_code("XX000"),
            );
        }
        state.executed.push(Executed {
            database: database.map(str::to_string),
            sql: sql.to_string(),
        });
        apply_ownership(&mut state, database, sql);
        Ok(())
    }
}

// Tracks ALTER .. OWNER TO statements so ownership reads reflect them.
fn apply_ownership(state: &mut MockState, database: Option<&str>, sql: &str) {
    let Some((head, owner)) = sql.split_once(" OWNER TO ") else {
        return;
    };
    let owner = owner.trim_matches('"').replace("\"\"", "\"");

    if let Some(name) = head.strip_prefix("ALTER DATABASE ") {
        let name = name.trim_matches('"').replace("\"\"", "\"");
        state.database_owners.insert(name, owner);
    } else if head.starts_with("ALTER SCHEMA ")
        && let Some(database) = database
    {
        state.schema_owners.insert(database.to_string(), owner);
    }
}

#[async_trait]
impl AdminBackend for MockBackend {
    async fn database_exists(&self, name: &str) -> Result<bool> {
        let mut state = self.state();
        state.existence_checks += 1;
        Ok(state.databases.contains(name))
    }

    async fn user_exists(&self, name: &str) -> Result<bool> {
        let mut state = self.state();
        state.existence_checks += 1;
        Ok(state.users.contains(name))
    }

    async fn execute(&self, sql: &str) -> std::result::Result<(), ServerError> {
        self.record(None, sql)
    }

    async fn connect_to(&self, database: &str) -> Result<Box<dyn DatabaseSession>> {
        let mut state = self.state();
        if state.fail_connect {
            return Err(PgTenantError::connection_failed(
                format!("failed to connect to {}", database),
                ServerError::new("connection refused"),
            ));
        }
        state.sessions_opened += 1;
        Ok(Box::new(MockSession {
            backend: self.clone(),
            database: database.to_string(),
            closed: false,
        }))
    }

    async fn database_owner(&self, database: &str) -> Result<String> {
        self.state()
            .database_owners
            .get(database)
            .cloned()
            .ok_or_else(|| PgTenantError::DatabaseNotFound {
                database: database.to_string(),
            })
    }

    async fn public_schema_owner(&self, database: &str) -> Result<String> {
        self.state()
            .schema_owners
            .get(database)
            .cloned()
            .ok_or_else(|| PgTenantError::DatabaseNotFound {
                database: database.to_string(),
            })
    }
}

struct MockSession {
    backend: MockBackend,
    database: String,
    closed: bool,
}

#[async_trait]
impl DatabaseSession for MockSession {
    async fn execute(&mut self, sql: &str) -> std::result::Result<(), ServerError> {
        if self.closed {
            return Err(ServerError::new("session closed"));
        }
        self.backend.record(Some(&self.database), sql)
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.backend.state().sessions_closed += 1;
        }
    }
}
