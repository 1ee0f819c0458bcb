//! In-memory store double for unit tests.
//!
//! A [`FakeStore`] answers every statement through a caller-supplied closure,
//! so each test scripts exactly the rows it cares about and can keep its own
//! state (counters, flags) behind the closure. Every statement is recorded.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::database::models::{Role, UserStatus};
use crate::database::{DatabaseError, Row, Statement, Store};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub enum Reply {
    Inserted(i64),
    Affected(u64),
    Row(Option<Row>),
    Rows(Vec<Row>),
    /// Unique violation on the named constraint.
    Conflict(String),
    Fail(String),
}

type Handler = dyn Fn(&Statement) -> Reply + Send + Sync;

pub struct FakeStore {
    handler: Box<Handler>,
    log: Mutex<Vec<Statement>>,
}

impl FakeStore {
    pub fn new(handler: impl Fn(&Statement) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Statements seen so far, in order.
    pub fn statements(&self) -> Vec<Statement> {
        self.log.lock().unwrap().clone()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.statements().iter().filter(|s| s.sql.contains(needle)).count()
    }

    fn answer(&self, stmt: &Statement) -> Reply {
        self.log.lock().unwrap().push(stmt.clone());
        (self.handler)(stmt)
    }
}

fn unexpected(kind: &str, reply: Reply, stmt: &Statement) -> DatabaseError {
    match reply {
        Reply::Fail(msg) => DatabaseError::QueryError(msg),
        Reply::Conflict(key) => DatabaseError::Conflict(key),
        other => DatabaseError::QueryError(format!("fake store: {:?} is not a valid {} reply for {}", other, kind, stmt.sql)),
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn insert(&self, stmt: Statement) -> Result<i64, DatabaseError> {
        match self.answer(&stmt) {
            Reply::Inserted(id) => Ok(id),
            other => Err(unexpected("insert", other, &stmt)),
        }
    }

    async fn execute(&self, stmt: Statement) -> Result<u64, DatabaseError> {
        match self.answer(&stmt) {
            Reply::Affected(n) => Ok(n),
            other => Err(unexpected("execute", other, &stmt)),
        }
    }

    async fn fetch_optional(&self, stmt: Statement) -> Result<Option<Row>, DatabaseError> {
        match self.answer(&stmt) {
            Reply::Row(row) => Ok(row),
            Reply::Rows(rows) => Ok(rows.into_iter().next()),
            other => Err(unexpected("fetch", other, &stmt)),
        }
    }

    async fn fetch_all(&self, stmt: Statement) -> Result<Vec<Row>, DatabaseError> {
        match self.answer(&stmt) {
            Reply::Rows(rows) => Ok(rows),
            Reply::Row(row) => Ok(row.into_iter().collect()),
            other => Err(unexpected("fetch", other, &stmt)),
        }
    }
}

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("row() needs a JSON object, got {}", other),
    }
}

pub fn user_row(id: i64, email: &str, status: UserStatus) -> Row {
    row(json!({
        "id": id,
        "created_at": "2024-01-01T00:00:00+00:00",
        "updated_at": "2024-01-01T00:00:00+00:00",
        "deleted_at": null,
        "name": "1704067200000123",
        "family_name": "",
        "nick_name": "1704067200000123",
        "email": email,
        "matricule": "1704067200000123",
        "age": 0,
        "birth_date": null,
        "sex": 0,
        "status": status.code(),
        "profile_image_xid": ""
    }))
}

pub fn authorization_row(id: i64, user_id: i64, level: Role) -> Row {
    row(json!({
        "id": id,
        "created_at": "2024-01-01T00:00:00+00:00",
        "updated_at": "2024-01-01T00:00:00+00:00",
        "deleted_at": null,
        "user_id": user_id,
        "level": level.code()
    }))
}

/// Development config with QR output redirected into a scratch directory.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    let scratch = std::env::temp_dir().join(format!("duval-api-test-{}", uuid::Uuid::new_v4().simple()));
    config.server.public_dir = scratch.to_string_lossy().into_owned();
    config.server.public_base_url = "http://duval.test".to_string();
    config
}

pub fn test_state(store: Arc<FakeStore>) -> AppState {
    AppState::new(store, test_config())
}
