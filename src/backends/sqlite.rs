//! SQLite database backend implementation
//!
//! This module provides the SQLite dialect, a [`Link`] over a single
//! `rusqlite` connection and the transform that maps host values onto
//! SQLite's storage classes.
//!
//! # Example
//!
//! ```rust,no_run
//! use rust_database_layer::backends::sqlite::sqlite_support;
//! use rust_database_layer::core::{Database, DatabaseConfig, DatabaseType, Result};
//!
//! # async fn example() -> Result<()> {
//! let config = DatabaseConfig::new("main", DatabaseType::Sqlite)
//!     .with_property("database", "app.db");
//! let mut db = Database::new(config, sqlite_support());
//! db.open().await?;
//!
//! db.create("users", |t| {
//!     t.integer("id");
//!     t.string("name", 100);
//!     t.primary("id");
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::core::config::DatabaseConfig;
use crate::core::database::Support;
use crate::core::error::{DatabaseError, Result};
use crate::core::link::{Link, Linker};
use crate::core::transform::Transform;
use crate::core::value::{Affecting, DatabaseValue, Row, RowList};
use crate::grammar::{
    glue, Bindings, ColumnType, ComponentBag, ConstraintDefinition, ConstraintType, Grammar,
    QueryGrammar, SchemaGrammar, StatementKind,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default timeout for database operations (30 seconds)
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Path used when the configuration names no database file
pub const MEMORY_DATABASE: &str = ":memory:";

fn double_quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// SQLite query dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteQueryGrammar;

impl Grammar for SqliteQueryGrammar {
    fn wrap(&self, identifier: &str) -> String {
        double_quote(identifier)
    }

    fn compile_statement(
        &self,
        kind: StatementKind,
        components: &ComponentBag,
        bindings: &Bindings,
    ) -> Result<Option<String>> {
        self.compile_query(kind, components, bindings)
    }
}

impl QueryGrammar for SqliteQueryGrammar {
    fn compile_empty_insert(&self, table: &str) -> String {
        glue(&["INSERT INTO", table, "DEFAULT VALUES"])
    }
}

/// SQLite schema dialect
///
/// Indexes and unique keys are separate `CREATE INDEX` statements, and an
/// `INTEGER` primary key increments through its rowid alias. Index names are
/// database-wide in SQLite, so they are prefixed with their table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSchemaGrammar;

impl SqliteSchemaGrammar {
    fn is_index(constraint_type: ConstraintType) -> bool {
        matches!(constraint_type, ConstraintType::Unique | ConstraintType::Index)
    }

    /// `<table>_<name>`, wrapped
    fn index_name(&self, table: &str, name: &str) -> String {
        self.wrap(&format!("{}_{}", table, name))
    }

    fn create_index(&self, table: &str, definition: &ConstraintDefinition) -> String {
        let keyword = match definition.constraint_type {
            ConstraintType::Unique => "CREATE UNIQUE INDEX",
            _ => "CREATE INDEX",
        };
        glue(&[
            keyword,
            &self.index_name(table, &definition.name),
            "ON",
            &self.wrap(table),
            "(",
            &self.escape(&definition.column),
            ")",
            ";",
        ])
    }
}

impl Grammar for SqliteSchemaGrammar {
    fn wrap(&self, identifier: &str) -> String {
        double_quote(identifier)
    }

    fn compile_statement(
        &self,
        kind: StatementKind,
        components: &ComponentBag,
        _bindings: &Bindings,
    ) -> Result<Option<String>> {
        self.compile_schema(kind, components)
    }
}

impl SchemaGrammar for SqliteSchemaGrammar {
    fn column_type(&self, column_type: ColumnType) -> String {
        match column_type {
            ColumnType::BigInteger => "INTEGER".to_string(),
            other => other.sql_name().to_string(),
        }
    }

    fn unsigned(&self, _unsigned: bool) -> String {
        String::new()
    }

    fn auto_increment(&self, _incremented: bool) -> String {
        String::new()
    }

    fn inline_constraint(&self, definition: &ConstraintDefinition) -> Option<String> {
        if Self::is_index(definition.constraint_type) {
            None
        } else {
            Some(self.constraint(definition))
        }
    }

    fn trailing_constraint(&self, table: &str, definition: &ConstraintDefinition) -> Option<String> {
        Self::is_index(definition.constraint_type).then(|| self.create_index(table, definition))
    }

    fn add_constraint_statement(&self, table: &str, definition: &ConstraintDefinition) -> String {
        if Self::is_index(definition.constraint_type) {
            self.create_index(table, definition)
        } else {
            self.alter_statement(&self.wrap(table), &self.add_constraint(definition))
        }
    }

    fn drop_constraint_statement(
        &self,
        table: &str,
        constraint_type: ConstraintType,
        name: &str,
    ) -> String {
        if Self::is_index(constraint_type) {
            glue(&["DROP INDEX", &self.index_name(table, name), ";"])
        } else {
            self.alter_statement(&self.wrap(table), &self.drop_constraint(constraint_type, name))
        }
    }
}

/// Maps host values onto SQLite storage classes and back
///
/// Booleans are stored as `0`/`1`; decimals and temporal values as text.
/// Reading back, the declared column type selects the host type.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteTransform;

impl SqliteTransform {
    fn mismatch(expected: &str, value: &DatabaseValue) -> DatabaseError {
        DatabaseError::type_mismatch(expected, value.type_name())
    }
}

impl Transform for SqliteTransform {
    fn to_database(&self, value: &DatabaseValue) -> Result<DatabaseValue> {
        Ok(match value {
            DatabaseValue::Bool(flag) => DatabaseValue::Long(i64::from(*flag)),
            DatabaseValue::Int(v) => DatabaseValue::Long(i64::from(*v)),
            DatabaseValue::Float(v) => DatabaseValue::Double(f64::from(*v)),
            DatabaseValue::Decimal(_)
            | DatabaseValue::Date(_)
            | DatabaseValue::Time(_)
            | DatabaseValue::DateTime(_) => DatabaseValue::String(value.as_string()),
            DatabaseValue::Array(_) => return Err(Self::mismatch("scalar", value)),
            other => other.clone(),
        })
    }

    fn to_host(&self, value: DatabaseValue, declared_type: Option<&str>) -> Result<DatabaseValue> {
        let Some(declared) = declared_type else {
            return Ok(value);
        };
        if value.is_null() {
            return Ok(value);
        }

        let base = declared
            .split('(')
            .next()
            .unwrap_or(declared)
            .trim()
            .to_ascii_uppercase();

        match base.as_str() {
            "BOOLEAN" | "BOOL" => value
                .as_bool()
                .map(DatabaseValue::Bool)
                .ok_or_else(|| Self::mismatch("bool", &value)),
            "DATE" => value
                .as_date()
                .map(DatabaseValue::Date)
                .ok_or_else(|| Self::mismatch("date", &value)),
            "TIME" => value
                .as_time()
                .map(DatabaseValue::Time)
                .ok_or_else(|| Self::mismatch("time", &value)),
            "DATETIME" | "TIMESTAMP" => value
                .as_date_time()
                .map(DatabaseValue::DateTime)
                .ok_or_else(|| Self::mismatch("datetime", &value)),
            "DECIMAL" | "NUMERIC" => value
                .as_decimal()
                .map(DatabaseValue::Decimal)
                .ok_or_else(|| Self::mismatch("decimal", &value)),
            _ => Ok(value),
        }
    }
}

/// Result set as read inside the blocking task, before the transform runs
struct RawRows {
    columns: Vec<(String, Option<String>)>,
    rows: Vec<Vec<DatabaseValue>>,
}

/// A link over one SQLite connection
///
/// # Thread Safety
/// The connection sits behind a mutex; operations are serialized and run on
/// tokio's blocking pool.
pub struct SqliteLink {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteLink {
    /// Wrap an open connection
    pub fn new(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn from_sqlite(value: ValueRef<'_>) -> DatabaseValue {
        match value {
            ValueRef::Null => DatabaseValue::Null,
            ValueRef::Integer(v) => DatabaseValue::Long(v),
            ValueRef::Real(v) => DatabaseValue::Double(v),
            ValueRef::Text(v) => DatabaseValue::String(String::from_utf8_lossy(v).to_string()),
            ValueRef::Blob(v) => DatabaseValue::Bytes(v.to_vec()),
        }
    }

    /// Convert an already transformed value to a rusqlite parameter
    fn to_sqlite(value: &DatabaseValue) -> Result<Value> {
        Ok(match value {
            DatabaseValue::Null => Value::Null,
            DatabaseValue::Bool(v) => Value::Integer(i64::from(*v)),
            DatabaseValue::Int(v) => Value::Integer(i64::from(*v)),
            DatabaseValue::Long(v) => Value::Integer(*v),
            DatabaseValue::Float(v) => Value::Real(f64::from(*v)),
            DatabaseValue::Double(v) => Value::Real(*v),
            DatabaseValue::String(v) => Value::Text(v.clone()),
            DatabaseValue::Bytes(v) => Value::Blob(v.clone()),
            DatabaseValue::Array(_) => {
                return Err(DatabaseError::type_mismatch("scalar", value.type_name()))
            }
            other => Value::Text(other.as_string()),
        })
    }

    fn to_sqlite_all(params: &[DatabaseValue]) -> Result<Vec<Value>> {
        params.iter().map(Self::to_sqlite).collect()
    }

    /// Run `operation` on the blocking pool, bounded by the operation timeout
    async fn run<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let connection_arc = Arc::clone(&self.connection);

        let mut task = tokio::task::spawn_blocking(move || -> Result<T> {
            let connection = connection_arc.lock();
            operation(&connection)
        });

        // Use select! to abort task on timeout, preventing resource leaks
        tokio::select! {
            result = &mut task => {
                result.map_err(|e| DatabaseError::other(format!("Task join error: {}", e)))?
            }
            _ = tokio::time::sleep(DEFAULT_OPERATION_TIMEOUT) => {
                task.abort();
                Err(DatabaseError::query_timeout(DEFAULT_OPERATION_TIMEOUT.as_millis() as u64))
            }
        }
    }

    async fn execute_with_params(&self, sql: &str, params: Vec<DatabaseValue>) -> Result<u64> {
        let sql = sql.to_string();
        let params = Self::to_sqlite_all(&params)?;

        self.run(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let affected = stmt.execute(params_from_iter(params.iter()))?;
            Ok(affected as u64)
        })
        .await
    }

    async fn execute_batch(&self, sql: &str) -> Result<()> {
        let sql = sql.to_string();
        self.run(move |conn| {
            conn.execute_batch(&sql)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl Link for SqliteLink {
    async fn select(
        &self,
        sql: &str,
        params: Vec<DatabaseValue>,
        transform: &dyn Transform,
    ) -> Result<RowList> {
        let query = sql.to_string();
        let params = Self::to_sqlite_all(&params)?;

        let raw = self
            .run(move |conn| {
                let mut stmt = conn.prepare(&query)?;
                let columns: Vec<(String, Option<String>)> = stmt
                    .columns()
                    .iter()
                    .map(|c| (c.name().to_string(), c.decl_type().map(str::to_string)))
                    .collect();

                let mut rows = stmt.query(params_from_iter(params.iter()))?;
                let mut results = Vec::new();
                while let Some(row) = rows.next()? {
                    let mut values = Vec::with_capacity(columns.len());
                    for i in 0..columns.len() {
                        values.push(Self::from_sqlite(row.get_ref(i)?));
                    }
                    results.push(values);
                }

                Ok(RawRows {
                    columns,
                    rows: results,
                })
            })
            .await?;

        let mut list = RowList::new();
        for values in raw.rows {
            let mut row = Row::new();
            for ((name, declared), value) in raw.columns.iter().zip(values) {
                row.set(name, transform.to_host(value, declared.as_deref())?);
            }
            list.push(row);
        }

        Ok(list)
    }

    async fn insert(&self, sql: &str, params: Vec<DatabaseValue>) -> Result<Affecting> {
        let sql = sql.to_string();
        let params = Self::to_sqlite_all(&params)?;

        self.run(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let affected = stmt.execute(params_from_iter(params.iter()))? as u64;

            let generated_keys = if affected > 0 {
                vec![DatabaseValue::Long(conn.last_insert_rowid())]
            } else {
                Vec::new()
            };
            Ok(Affecting::new(affected, generated_keys))
        })
        .await
    }

    async fn update(&self, sql: &str, params: Vec<DatabaseValue>) -> Result<Affecting> {
        let affected = self.execute_with_params(sql, params).await?;
        Ok(Affecting::new(affected, Vec::new()))
    }

    async fn delete(&self, sql: &str, params: Vec<DatabaseValue>) -> Result<Affecting> {
        let affected = self.execute_with_params(sql, params).await?;
        Ok(Affecting::new(affected, Vec::new()))
    }

    async fn create(&self, sql: &str) -> Result<()> {
        self.execute_batch(sql).await
    }

    async fn alter(&self, sql: &str) -> Result<()> {
        self.execute_batch(sql).await
    }

    async fn drop(&self, sql: &str) -> Result<()> {
        self.execute_batch(sql).await
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let table = table.to_string();
        self.run(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [&table],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
    }
}

/// Opens [`SqliteLink`]s from the `database` property (a file path)
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteLinker;

#[async_trait]
impl Linker for SqliteLinker {
    async fn open(&self, config: &DatabaseConfig) -> Result<Box<dyn Link>> {
        let path = config.property_or("database", MEMORY_DATABASE).to_string();
        debug!(database = %config.name, path = %path, "opening sqlite connection");

        // Offload blocking database operations to blocking thread pool with timeout
        let mut task = tokio::task::spawn_blocking(move || -> Result<Connection> {
            let conn = Connection::open(&path)?;

            // Enable foreign keys
            conn.execute("PRAGMA foreign_keys = ON", [])?;

            Ok(conn)
        });

        let connection = tokio::select! {
            result = &mut task => {
                result.map_err(|e| DatabaseError::other(format!("Task join error: {}", e)))??
            }
            _ = tokio::time::sleep(DEFAULT_OPERATION_TIMEOUT) => {
                task.abort();
                return Err(DatabaseError::query_timeout(DEFAULT_OPERATION_TIMEOUT.as_millis() as u64));
            }
        };

        Ok(Box::new(SqliteLink::new(connection)))
    }
}

/// Support bundle of the SQLite backend
pub fn sqlite_support() -> Support {
    Support::new(
        SqliteLinker,
        SqliteQueryGrammar,
        SqliteSchemaGrammar,
        SqliteTransform,
    )
}
