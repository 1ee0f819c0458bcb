//! The relational store seam.
//!
//! Handlers and services only ever see `dyn Store`; production wires in
//! [`PgStore`], unit tests an in-memory fake.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo};
use tracing::debug;

use super::manager::{DatabaseError, DatabaseManager};
use super::mapper::{build_delete, build_insert, build_update, Entity, Statement};
use super::value::SqlValue;

/// A fetched row keyed by column name.
pub type Row = Map<String, Value>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Runs an `INSERT ... RETURNING "id"` and yields the new id.
    async fn insert(&self, stmt: Statement) -> Result<i64, DatabaseError>;

    /// Runs a statement and yields the number of rows affected.
    async fn execute(&self, stmt: Statement) -> Result<u64, DatabaseError>;

    async fn fetch_optional(&self, stmt: Statement) -> Result<Option<Row>, DatabaseError>;

    async fn fetch_all(&self, stmt: Statement) -> Result<Vec<Row>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.fetch_optional(Statement::new("SELECT 1 AS ok")).await.map(|_| ())
    }
}

impl dyn Store {
    pub async fn fetch_one_as<T: DeserializeOwned>(
        &self,
        stmt: Statement,
        what: &str,
    ) -> Result<T, DatabaseError> {
        self.fetch_optional_as(stmt)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(what.to_string()))
    }

    pub async fn fetch_optional_as<T: DeserializeOwned>(
        &self,
        stmt: Statement,
    ) -> Result<Option<T>, DatabaseError> {
        match self.fetch_optional(stmt).await? {
            Some(row) => Ok(Some(decode_row(row)?)),
            None => Ok(None),
        }
    }

    pub async fn fetch_all_as<T: DeserializeOwned>(
        &self,
        stmt: Statement,
    ) -> Result<Vec<T>, DatabaseError> {
        self.fetch_all(stmt)
            .await?
            .into_iter()
            .map(decode_row)
            .collect()
    }

    /// Live (not soft-deleted) row by id.
    pub async fn find_by_id<E>(&self, id: i64) -> Result<E, DatabaseError>
    where
        E: Entity + DeserializeOwned,
    {
        let schema = E::schema();
        let stmt = Statement::new(format!(
            "SELECT * FROM {} WHERE \"id\" = $1 AND \"deleted_at\" IS NULL",
            schema.quoted_table()
        ))
        .bind(id);
        self.fetch_one_as(stmt, &format!("{} {}", schema.table, id)).await
    }

    pub async fn insert_entity<E: Entity + Sync>(&self, entity: &E) -> Result<i64, DatabaseError> {
        let stmt = build_insert(entity);
        self.insert(stmt).await
    }

    pub async fn update_entity<E: Entity + Sync>(&self, entity: &E) -> Result<u64, DatabaseError> {
        let stmt = build_update(entity);
        self.execute(stmt).await
    }

    pub async fn delete_entity<E: Entity + Sync>(&self, entity: &E) -> Result<u64, DatabaseError> {
        let stmt = build_delete(entity);
        self.execute(stmt).await
    }
}

fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T, DatabaseError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| DatabaseError::Decode(e.to_string()))
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert(&self, stmt: Statement) -> Result<i64, DatabaseError> {
        debug!("insert: {}", stmt.describe());
        let row = bind_params(sqlx::query(&stmt.sql), &stmt.params)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseManager::classify)?;
        Ok(row.try_get::<i64, _>("id")?)
    }

    async fn execute(&self, stmt: Statement) -> Result<u64, DatabaseError> {
        debug!("execute: {}", stmt.describe());
        let result = bind_params(sqlx::query(&stmt.sql), &stmt.params)
            .execute(&self.pool)
            .await
            .map_err(DatabaseManager::classify)?;
        Ok(result.rows_affected())
    }

    async fn fetch_optional(&self, stmt: Statement) -> Result<Option<Row>, DatabaseError> {
        debug!("fetch_optional: {}", stmt.describe());
        let row = bind_params(sqlx::query(&stmt.sql), &stmt.params)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseManager::classify)?;
        row.as_ref().map(row_to_json).transpose()
    }

    async fn fetch_all(&self, stmt: Statement) -> Result<Vec<Row>, DatabaseError> {
        debug!("fetch_all: {}", stmt.describe());
        let rows = bind_params(sqlx::query(&stmt.sql), &stmt.params)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseManager::classify)?;
        rows.iter().map(row_to_json).collect()
    }
}

fn bind_params<'q>(
    mut q: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        q = match p {
            SqlValue::Bool(v) => q.bind(*v),
            SqlValue::Int(v) => q.bind(*v),
            SqlValue::Float(v) => q.bind(*v),
            SqlValue::Text(v) => q.bind(v.as_deref()),
            SqlValue::Timestamp(v) => q.bind(*v),
        };
    }
    q
}

/// Converts a row to JSON by declared column type.
fn row_to_json(row: &PgRow) -> Result<Row, DatabaseError> {
    let mut map = Map::new();

    for column in row.columns() {
        let i = column.ordinal();
        let value = match column.type_info().name() {
            "INT2" => row.try_get::<Option<i16>, _>(i)?.map(Value::from),
            "INT4" => row.try_get::<Option<i32>, _>(i)?.map(Value::from),
            "INT8" => row.try_get::<Option<i64>, _>(i)?.map(Value::from),
            "FLOAT4" => row.try_get::<Option<f32>, _>(i)?.map(|v| Value::from(f64::from(v))),
            "FLOAT8" => row.try_get::<Option<f64>, _>(i)?.map(Value::from),
            "BOOL" => row.try_get::<Option<bool>, _>(i)?.map(Value::from),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row.try_get::<Option<String>, _>(i)?.map(Value::from),
            "TIMESTAMPTZ" => row
                .try_get::<Option<DateTime<Utc>>, _>(i)?
                .map(|v| Value::String(v.to_rfc3339())),
            "TIMESTAMP" => row
                .try_get::<Option<NaiveDateTime>, _>(i)?
                .map(|v| Value::String(v.and_utc().to_rfc3339())),
            "DATE" => row.try_get::<Option<NaiveDate>, _>(i)?.map(|v| Value::String(v.to_string())),
            "UUID" => row.try_get::<Option<uuid::Uuid>, _>(i)?.map(|v| Value::String(v.to_string())),
            "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(i)?,
            other => {
                return Err(DatabaseError::Decode(format!(
                    "unsupported column type {} for \"{}\"",
                    other,
                    column.name()
                )))
            }
        };

        map.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }

    Ok(map)
}
